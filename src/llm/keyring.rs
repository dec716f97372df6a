use super::{GeminiClient, LlmClient, LlmError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ordered LLM clients, one per API key. A failing key hands over to the
/// next one, and the ring remembers where it left off.
pub struct KeyRing {
    clients: Vec<Arc<dyn LlmClient>>,
    current: AtomicUsize,
    retry_delay: Duration,
}

impl KeyRing {
    pub fn new(clients: Vec<Arc<dyn LlmClient>>) -> Self {
        Self {
            clients,
            current: AtomicUsize::new(0),
            retry_delay: Duration::from_secs(1),
        }
    }

    /// One Gemini client per non-blank key, sharing a connection pool.
    pub fn gemini(keys: &[String], model: &str, base_url: &str) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let clients: Vec<Arc<dyn LlmClient>> = keys
            .iter()
            .filter(|k| !k.trim().is_empty())
            .enumerate()
            .map(|(i, key)| {
                Arc::new(
                    GeminiClient::new(http.clone(), key.trim())
                        .model(model)
                        .base_url(base_url)
                        .with_name(format!("gemini-key-{}", i + 1)),
                ) as Arc<dyn LlmClient>
            })
            .collect();
        info!("{} Gemini key(s) configured", clients.len());
        Ok(Self::new(clients))
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Index of the key the next call starts with.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Try each key once, starting at the current one, until a response
    /// passes `accept`. Every failed or rejected attempt moves the ring on
    /// and waits `retry_delay`.
    pub async fn generate<F>(&self, prompt: &str, accept: F) -> Result<String, LlmError>
    where
        F: Fn(&str) -> bool,
    {
        let len = self.clients.len();
        if len == 0 {
            return Err(LlmError::NoClients);
        }

        let mut last = LlmError::Rejected;
        for _ in 0..len {
            let idx = self.current.load(Ordering::SeqCst) % len;
            let client = &self.clients[idx];
            debug!("Trying {}", client.name());

            match client.generate(prompt).await {
                Ok(text) if accept(&text) => {
                    debug!("{} succeeded", client.name());
                    return Ok(text);
                }
                Ok(_) => {
                    warn!("{} response rejected", client.name());
                    last = LlmError::Rejected;
                }
                Err(e) => {
                    warn!("{} failed: {}", client.name(), e);
                    last = e;
                }
            }

            self.current.store((idx + 1) % len, Ordering::SeqCst);
            if !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(last)
    }
}
