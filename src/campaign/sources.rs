use super::{ContactSource, SocialOutreach};
use crate::Result;
use async_trait::async_trait;
use outreach_browser::{
    site_lock, BrowserOptions, BrowserSession, LeadSearch, Network, PersonOutcome, Site,
};
use outreach_contacts::Person;
use tracing::{debug, warn};

/// Keep the cookies after a successful flow and close the browser whatever
/// the outcome.
async fn finish<T>(
    site: Site,
    options: &BrowserOptions,
    session: BrowserSession,
    result: outreach_browser::Result<T>,
) -> Result<T> {
    if result.is_ok() && options.cookie_jar.is_some() {
        if let Err(e) = session.save_cookies().await {
            warn!("Could not save {} cookies: {}", site, e);
        }
    }
    if let Err(e) = session.close().await {
        warn!("Could not close {} browser: {}", site, e);
    }
    Ok(result?)
}

/// Addresses scraped from the lead-search tool.
pub struct BrowserContacts {
    search: LeadSearch,
    options: BrowserOptions,
}

impl BrowserContacts {
    pub fn new(search: LeadSearch, options: BrowserOptions) -> Self {
        Self { search, options }
    }
}

#[async_trait]
impl ContactSource for BrowserContacts {
    async fn raw_emails(&self, domain: &str) -> Result<Vec<String>> {
        let _guard = site_lock(Site::LeadSearch).lock().await;
        debug!("Starting lead-search session for {}", domain);
        let session = BrowserSession::launch(&self.options).await?;
        let result = self.search.find_emails(&session, domain).await;
        finish(Site::LeadSearch, &self.options, session, result).await
    }
}

/// Connection requests through the professional network.
pub struct BrowserSocial {
    network: Network,
    options: BrowserOptions,
}

impl BrowserSocial {
    pub fn new(network: Network, options: BrowserOptions) -> Self {
        Self { network, options }
    }
}

#[async_trait]
impl SocialOutreach for BrowserSocial {
    async fn reach(
        &self,
        people: &[Person],
        company: &str,
        max_connections: usize,
    ) -> Result<Vec<PersonOutcome>> {
        let _guard = site_lock(Site::Network).lock().await;
        debug!("Starting network session for {} people", people.len());
        let session = BrowserSession::launch(&self.options).await?;
        let result = self
            .network
            .reach(&session, people, company, max_connections)
            .await;
        finish(Site::Network, &self.options, session, result).await
    }
}
