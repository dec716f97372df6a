//! # outreach
//!
//! Cold-outreach campaigns for a single company domain: scrape candidate
//! addresses, separate people from role mailboxes, draft a message with an
//! LLM, send it by email and look the same people up on a professional
//! network.
//!
//! Each campaign runs as one background task; results live in memory and are
//! served by a small HTTP API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outreach::{api, Orchestrator, Settings};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> outreach::Result<()> {
//! let settings = Settings::from_env();
//! let orchestrator = Arc::new(Orchestrator::from_settings(&settings)?);
//! let app = api::router(api::AppState::new(orchestrator, settings.network_configured()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod campaign;
pub mod classify;
pub mod compose;
pub mod config;
pub mod llm;

pub use campaign::{
    CampaignRecord, CampaignRequest, CampaignStatus, CampaignStore, ContactSource, Orchestrator,
    SocialOutreach,
};
pub use classify::{Classification, Classifier, Method};
pub use compose::{load_resume, Composed, Composer, Draft, Persona, Source};
pub use config::Settings;
pub use llm::{GeminiClient, KeyRing, LlmClient, LlmError};

/// Result type for outreach operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Browser(#[from] outreach_browser::Error),

    #[error("{0}")]
    Mail(#[from] outreach_mail::Error),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),
}
