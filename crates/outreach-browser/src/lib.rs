//! # outreach-browser
//!
//! Browser-driven steps of an outreach campaign, built on a stealth Chrome
//! session: scraping addresses from a lead-search tool and sending
//! connection requests on a professional network.
//!
//! Selectors, URLs and timings live in YAML site profiles. The built-in ones
//! are embedded; a directory of overrides can replace them without a rebuild.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outreach_browser::{BrowserOptions, BrowserSession, LeadSearch, Site, SiteProfile};
//!
//! # #[tokio::main]
//! # async fn main() -> outreach_browser::Result<()> {
//! let search = LeadSearch::new(SiteProfile::builtin(Site::LeadSearch)?)?;
//! let session = BrowserSession::launch(&BrowserOptions::default()).await?;
//! let emails = search.find_emails(&session, "acme.io").await?;
//! println!("{} addresses", emails.len());
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

mod lead_search;
mod login;
mod network;
mod params;
mod profile;
mod session;

pub use lead_search::LeadSearch;
pub use login::interactive_login;
pub use network::{Network, PersonOutcome};
pub use params::{encode_component, render, Params};
pub use profile::{ProfileKeys, Site, SiteProfile};
pub use session::{BrowserOptions, BrowserSession, StoredCookie, Viewport};

use std::sync::OnceLock;
use tokio::sync::Mutex;

/// Result type for browser operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("not logged in to {0}")]
    LoginRequired(String),
}

/// One lock per site. Two sessions on the same account fight over cookies
/// and trip rate limits, so callers hold this for the whole flow.
pub fn site_lock(site: Site) -> &'static Mutex<()> {
    static LEAD_SEARCH: OnceLock<Mutex<()>> = OnceLock::new();
    static NETWORK: OnceLock<Mutex<()>> = OnceLock::new();
    let cell = match site {
        Site::LeadSearch => &LEAD_SEARCH,
        Site::Network => &NETWORK,
    };
    cell.get_or_init(|| Mutex::new(()))
}
