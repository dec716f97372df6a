use crate::params::{encode_component, Params};
use crate::profile::{ProfileKeys, SiteProfile};
use crate::session::BrowserSession;
use crate::{Error, Result};
use outreach_contacts::{extract_emails, is_email};
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Scrapes candidate addresses for a domain from the lead-search tool.
pub struct LeadSearch {
    profile: SiteProfile,
}

impl LeadSearch {
    pub const KEYS: ProfileKeys = ProfileKeys {
        urls: &["search", "results"],
        selectors: &["search_input", "submit", "results", "emails"],
        markers: &["busy", "done", "empty", "login_page"],
        timings: &[
            "input_timeout",
            "login_wait",
            "login_poll",
            "results_timeout",
            "settle",
            "emails_timeout",
            "poll",
        ],
        limits: &["min_emails"],
    };

    pub fn new(profile: SiteProfile) -> Result<Self> {
        profile.check_keys(&Self::KEYS)?;
        Ok(Self { profile })
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Every address the tool shows for `domain`, lowercased and unique.
    pub async fn find_emails(&self, session: &BrowserSession, domain: &str) -> Result<Vec<String>> {
        let p = &self.profile;
        info!("Searching emails for {} on {}", domain, p.name);

        let search_url = p.url("search", &Params::new())?;
        session.goto(&search_url).await?;

        let input = match session
            .wait_for_any(p.selectors("search_input"), p.timing("input_timeout")?)
            .await?
        {
            Some(sel) => sel,
            None => self.await_login(session, &search_url).await?,
        };

        session.fill(&input, domain).await?;
        debug!("Entered domain '{}'", domain);

        let submit = session
            .first_present(p.selectors("submit"))
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} search button", p.name)))?;
        session.click(&submit).await?;
        debug!("Clicked search button");

        info!(
            "Waiting for search results (up to {:?})",
            p.timing("results_timeout")?
        );
        if !self.wait_for_results(session).await? {
            warn!("Timeout waiting for results, continuing");
        }

        session.pause(p.timing("settle")?).await;

        if !self.wait_for_addresses(session).await? {
            warn!("Address count never passed the threshold, continuing");
        }

        let url = session.url().await?;
        if !url.contains(&search_url) && !search_url.contains(&url) {
            let results_url = p.url(
                "results",
                &Params::new().set("domain", encode_component(domain)),
            )?;
            warn!("Left the results page ({}), loading {}", url, results_url);
            session.goto(&results_url).await?;
            session.settle().await;
        }

        let emails = self.scrape(session).await?;
        if emails.is_empty() {
            info!("No emails found for {}", domain);
        } else {
            info!("Found {} emails for {}", emails.len(), domain);
        }
        Ok(emails)
    }

    /// The search form is missing: assume a login wall and wait for the
    /// operator to get past it in the browser window.
    async fn await_login(&self, session: &BrowserSession, search_url: &str) -> Result<String> {
        let p = &self.profile;
        let wait = p.timing("login_wait")?;
        warn!(
            "{} login required. Log in in the browser window (waiting up to {:?})",
            p.name, wait
        );

        let deadline = Instant::now() + wait;
        while Instant::now() < deadline {
            session.pause(p.timing("login_poll")?).await;

            if let Some(sel) = session.first_present(p.selectors("search_input")).await? {
                info!("{} session is active", p.name);
                return Ok(sel);
            }
            // Logged in but parked elsewhere, e.g. a dashboard.
            let url = session.url().await?;
            if !p.has_marker("login_page", &url) && !url.starts_with(search_url) {
                session.goto(search_url).await?;
            }
        }

        Err(Error::LoginRequired(p.name.clone()))
    }

    async fn wait_for_results(&self, session: &BrowserSession) -> Result<bool> {
        let p = &self.profile;
        let deadline = Instant::now() + p.timing("results_timeout")?;
        loop {
            let html = session.html().await?;
            let busy = p.markers("busy").iter().any(|m| html.contains(m.as_str()));
            if !busy
                && (p.has_marker("done", &html)
                    || session.first_present(p.selectors("results")).await?.is_some())
            {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            session.pause(p.timing("poll")?).await;
        }
    }

    async fn wait_for_addresses(&self, session: &BrowserSession) -> Result<bool> {
        let p = &self.profile;
        let min = p.limit("min_emails")?;
        let deadline = Instant::now() + p.timing("emails_timeout")?;
        loop {
            let html = session.html().await?;
            if p.has_marker("empty", &html) {
                return Ok(true);
            }
            let count = extract_emails(&html).len();
            debug!("Currently {} addresses on page", count);
            if count > min {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            session.pause(p.timing("poll")?).await;
        }
    }

    /// Try the address selectors in order; fall back to a regex over the page.
    async fn scrape(&self, session: &BrowserSession) -> Result<Vec<String>> {
        for sel in self.profile.selectors("emails") {
            let found = whole_addresses(session.texts(sel).await?);
            if !found.is_empty() {
                debug!("Selector '{}' yielded {} addresses", sel, found.len());
                return Ok(found);
            }
        }

        debug!("No selector yielded addresses, scanning page source");
        let html = session.html().await?;
        Ok(extract_emails(&html))
    }
}

/// Element texts that are exactly one address, lowercased, first-seen order.
fn whole_addresses(texts: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    texts
        .into_iter()
        .filter(|t| is_email(t))
        .map(|t| t.trim().to_lowercase())
        .filter(|e| seen.insert(e.clone()))
        .collect()
}
