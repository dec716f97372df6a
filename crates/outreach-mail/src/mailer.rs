use crate::message::{build_message, OutgoingEmail};
use crate::provider::SmtpProvider;
use crate::transport::{SmtpTransport, Transport};
use crate::{Error, Result};
use lettre::message::Mailbox;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Which provider accepted a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub provider: String,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCheck {
    pub provider: String,
    pub email: String,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
}

/// Sends through providers in order until one accepts the message.
pub struct Mailer {
    providers: Vec<SmtpProvider>,
    transport: Arc<dyn Transport>,
    retry_delay: Duration,
}

impl Mailer {
    pub fn new(providers: Vec<SmtpProvider>) -> Self {
        for provider in &providers {
            info!("Email provider ready: {}", provider.name);
        }
        if providers.is_empty() {
            warn!("No email providers configured");
        }
        Self {
            providers,
            transport: Arc::new(SmtpTransport),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Pause between one provider failing and trying the next.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn providers(&self) -> &[SmtpProvider] {
        &self.providers
    }

    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<Delivery> {
        if self.providers.is_empty() {
            return Err(Error::NoProviders);
        }
        // A malformed recipient fails the same way on every provider.
        email.to.trim().parse::<Mailbox>()?;

        let total = self.providers.len();
        for (i, provider) in self.providers.iter().enumerate() {
            let attempt = i + 1;
            info!(
                "Sending to {} via {} ({}/{})",
                email.to, provider.name, attempt, total
            );

            let result = match build_message(&provider.username, email) {
                Ok(message) => self.transport.send(provider, message).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match result {
                Ok(()) => {
                    info!("Email sent to {} via {}", email.to, provider.name);
                    return Ok(Delivery {
                        provider: provider.name.clone(),
                        attempts: attempt,
                    });
                }
                Err(e) => warn!("{} failed for {}: {}", provider.name, email.to, e),
            }

            if attempt < total && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(Error::AllProvidersFailed {
            to: email.to.clone(),
            attempts: total,
        })
    }

    /// Log in to every provider without sending.
    pub async fn test_connections(&self) -> Vec<ConnectionCheck> {
        let mut checks = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let success = match self.transport.test(provider).await {
                Ok(ok) => ok,
                Err(e) => {
                    warn!("{} connection failed: {}", provider.name, e);
                    false
                }
            };
            if success {
                info!("{} connection successful", provider.name);
            }
            checks.push(ConnectionCheck {
                provider: provider.name.clone(),
                email: provider.username.clone(),
                success,
            });
        }
        checks
    }

    /// Send the same message to many recipients, pausing `delay` after each.
    pub async fn send_bulk(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
        delay: Duration,
    ) -> BulkReport {
        let mut report = BulkReport {
            total: recipients.len(),
            ..BulkReport::default()
        };

        for to in recipients {
            match self.send(&OutgoingEmail::new(to.clone(), subject, body)).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    warn!("Error sending to {}: {}", to, e);
                    report.failed += 1;
                }
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        report
    }
}
