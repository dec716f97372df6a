//! Runtime settings: credentials from the environment (after `.env` is
//! loaded), file locations and browser options from the command line.

use crate::llm::{KeyRing, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::{Error, Result};
use outreach_browser::{BrowserOptions, Site};
use outreach_mail::{standard_providers, Account, SmtpProvider};
use std::fmt;
use std::path::PathBuf;

const GEMINI_KEY_VARS: [&str; 3] = ["GEMINI_API_KEY_1", "GEMINI_API_KEY_2", "GEMINI_API_KEY"];

#[derive(Clone)]
pub struct Settings {
    /// In rotation order, blanks and duplicates removed.
    pub gemini_keys: Vec<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gmail: Option<Account>,
    pub outlook: Option<Account>,
    /// Account the network session is logged in as. Only reported; login
    /// itself is done by hand.
    pub network_email: Option<String>,

    pub persona_path: Option<PathBuf>,
    pub resume_path: PathBuf,
    pub profile_dir: Option<PathBuf>,
    pub cookie_dir: PathBuf,
    pub headless: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut gemini_keys: Vec<String> = Vec::new();
        for var in GEMINI_KEY_VARS {
            if let Some(key) = get(var) {
                if !gemini_keys.contains(&key) {
                    gemini_keys.push(key);
                }
            }
        }

        Self {
            gemini_keys,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            gmail: Account::from_parts(get("GMAIL_EMAIL"), get("GMAIL_APP_PASSWORD")),
            outlook: Account::from_parts(get("OUTLOOK_EMAIL"), get("OUTLOOK_PASSWORD")),
            network_email: get("LINKEDIN_EMAIL"),
            persona_path: None,
            resume_path: PathBuf::from("resume.txt"),
            profile_dir: None,
            cookie_dir: PathBuf::from(".cookies"),
            headless: false,
        }
    }

    /// `None` when no key is configured.
    pub fn key_ring(&self) -> Result<Option<KeyRing>> {
        if self.gemini_keys.is_empty() {
            return Ok(None);
        }
        let ring = KeyRing::gemini(&self.gemini_keys, &self.gemini_model, &self.gemini_base_url)?;
        Ok(Some(ring))
    }

    pub fn smtp_providers(&self) -> Vec<SmtpProvider> {
        standard_providers(self.gmail.clone(), self.outlook.clone())
    }

    pub fn network_configured(&self) -> bool {
        self.network_email.is_some()
    }

    pub fn cookie_jar(&self, site: Site) -> PathBuf {
        self.cookie_dir.join(site.cookie_file())
    }

    pub fn browser_options(&self, site: Site) -> BrowserOptions {
        BrowserOptions::default()
            .headless(self.headless)
            .cookie_jar(self.cookie_jar(site))
    }

    /// Fail on settings that cannot work at all.
    pub fn validate(&self) -> Result<()> {
        if !self.gemini_base_url.starts_with("http://") && !self.gemini_base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "GEMINI_BASE_URL must be an http(s) URL, got '{}'",
                self.gemini_base_url
            )));
        }
        if self.gemini_model.contains('/') || self.gemini_model.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "invalid GEMINI_MODEL '{}'",
                self.gemini_model
            )));
        }
        if let Some(path) = &self.persona_path {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "persona file not found: {}",
                    path.display()
                )));
            }
        }
        if let Some(dir) = &self.profile_dir {
            if !dir.is_dir() {
                return Err(Error::Config(format!(
                    "profile directory not found: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("gemini_keys", &self.gemini_keys.len())
            .field("gemini_model", &self.gemini_model)
            .field("gmail", &self.gmail)
            .field("outlook", &self.outlook)
            .field("network_email", &self.network_email)
            .field("resume_path", &self.resume_path)
            .field("cookie_dir", &self.cookie_dir)
            .finish_non_exhaustive()
    }
}
