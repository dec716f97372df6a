//! Text generation through an LLM, with one client per API key and rotation
//! across keys when a call fails.

mod gemini;
mod keyring;
mod mock;

pub use gemini::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use keyring::KeyRing;
pub use mock::{MockLlmClient, MockReply};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("empty response from {0}")]
    Empty(String),

    #[error("response failed the quality check")]
    Rejected,

    #[error("no llm clients configured")]
    NoClients,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete `prompt`, returning the trimmed response text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    fn name(&self) -> &str;
}
