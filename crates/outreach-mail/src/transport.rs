use crate::provider::{Security, SmtpProvider};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;

/// Why one provider could not deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Authentication,
    RecipientRefused,
    Timeout,
    Transient,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Authentication => "authentication failed",
            FailureKind::RecipientRefused => "recipient refused",
            FailureKind::Timeout => "timed out",
            FailureKind::Transient => "transient failure",
            FailureKind::Other => "failed",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct SendFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SendFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Delivers a built message through one provider.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, provider: &SmtpProvider, message: Message) -> Result<(), SendFailure>;

    /// Connect and authenticate without sending anything.
    async fn test(&self, provider: &SmtpProvider) -> Result<bool, SendFailure>;
}

/// Real SMTP over lettre's tokio transport. A fresh connection per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpTransport;

impl SmtpTransport {
    fn connect(
        provider: &SmtpProvider,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, lettre::transport::smtp::Error> {
        let builder = match provider.security {
            Security::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&provider.host)?,
            Security::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&provider.host)?
            }
        };
        Ok(builder
            .port(provider.port)
            .credentials(Credentials::new(
                provider.username.clone(),
                provider.password.clone(),
            ))
            .timeout(Some(provider.timeout))
            .build())
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, provider: &SmtpProvider, message: Message) -> Result<(), SendFailure> {
        let transport = Self::connect(provider).map_err(|e| categorize(&e))?;
        transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| categorize(&e))
    }

    async fn test(&self, provider: &SmtpProvider) -> Result<bool, SendFailure> {
        let transport = Self::connect(provider).map_err(|e| categorize(&e))?;
        transport.test_connection().await.map_err(|e| categorize(&e))
    }
}

fn categorize(err: &lettre::transport::smtp::Error) -> SendFailure {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if let Some(kind) = err.status().and_then(|code| kind_for_status(&code.to_string())) {
        kind
    } else if err.is_transient() {
        FailureKind::Transient
    } else {
        FailureKind::Other
    };
    SendFailure::new(kind, err.to_string())
}

fn kind_for_status(code: &str) -> Option<FailureKind> {
    match code {
        "530" | "534" | "535" => Some(FailureKind::Authentication),
        "550" | "551" | "553" => Some(FailureKind::RecipientRefused),
        c if c.starts_with('4') => Some(FailureKind::Transient),
        _ => None,
    }
}
