//! Campaign requests, records and the seams the orchestrator drives.

mod runner;
mod sources;
mod store;

pub use runner::Orchestrator;
pub use sources::{BrowserContacts, BrowserSocial};
pub use store::CampaignStore;

use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_browser::PersonOutcome;
use outreach_contacts::Person;
use serde::{Deserialize, Serialize};

fn default_target_count() -> usize {
    5
}

fn enabled() -> bool {
    true
}

/// Body of `POST /api/launch`.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignRequest {
    /// Missing and `null` both read as absent.
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_target_count")]
    pub target_email_count: usize,
    #[serde(default)]
    pub job_description: String,
    #[serde(default = "enabled")]
    pub email_enabled: bool,
    #[serde(default = "enabled", alias = "linkedin_enabled")]
    pub social_enabled: bool,
}

impl CampaignRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            target_email_count: default_target_count(),
            job_description: String::new(),
            email_enabled: true,
            social_enabled: true,
        }
    }

    /// The trimmed domain, empty when none was given.
    pub fn domain(&self) -> &str {
        self.domain.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain().is_empty() {
            return Err(Error::InvalidRequest("Domain is required".into()));
        }
        if !self.email_enabled && !self.social_enabled {
            return Err(Error::InvalidRequest(
                "At least one outreach method must be enabled".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignRecord {
    pub id: u64,
    pub domain: String,
    pub status: CampaignStatus,
    pub emails_found: usize,
    pub emails_sent: usize,
    pub network_people_found: usize,
    pub network_connections_sent: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CampaignRecord {
    fn new(id: u64, domain: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
            status: CampaignStatus::Running,
            emails_found: 0,
            emails_sent: 0,
            network_people_found: 0,
            network_connections_sent: 0,
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Completed when anything went out, failed otherwise.
    fn finish(&mut self) {
        self.status = if self.emails_sent > 0 || self.network_connections_sent > 0 {
            CampaignStatus::Completed
        } else {
            CampaignStatus::Failed
        };
        self.completed_at = Some(Utc::now());
    }

    fn fail(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.status = CampaignStatus::Failed;
        self.completed_at = Some(Utc::now());
    }
}

/// Where raw candidate addresses for a domain come from.
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn raw_emails(&self, domain: &str) -> Result<Vec<String>>;
}

/// Finding people on a professional network and asking to connect.
#[async_trait]
pub trait SocialOutreach: Send + Sync {
    async fn reach(
        &self,
        people: &[Person],
        company: &str,
        max_connections: usize,
    ) -> Result<Vec<PersonOutcome>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req: CampaignRequest = serde_json::from_str(r#"{"domain": "acme.io"}"#).unwrap();
        assert_eq!(req.target_email_count, 5);
        assert!(req.email_enabled);
        assert!(req.social_enabled);
        assert!(req.job_description.is_empty());
    }

    #[test]
    fn null_or_missing_domain_is_required() {
        for body in [r#"{}"#, r#"{"domain": null}"#, r#"{"domain": " "}"#] {
            let req: CampaignRequest = serde_json::from_str(body).unwrap();
            let err = req.validate().unwrap_err();
            assert_eq!(err.to_string(), "invalid request: Domain is required", "{body}");
        }
        assert_eq!(CampaignRequest::new(" acme.io ").domain(), "acme.io");
    }

    #[test]
    fn linkedin_alias() {
        let req: CampaignRequest =
            serde_json::from_str(r#"{"domain": "acme.io", "linkedin_enabled": false}"#).unwrap();
        assert!(!req.social_enabled);
    }

    #[test]
    fn validation_messages() {
        let err = CampaignRequest::new("  ").validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid request: Domain is required");

        let mut req = CampaignRequest::new("acme.io");
        req.email_enabled = false;
        req.social_enabled = false;
        let err = req.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(ref m) if m == "At least one outreach method must be enabled"));
    }

    #[test]
    fn finish_sets_status() {
        let mut rec = CampaignRecord::new(1, "acme.io");
        rec.finish();
        assert_eq!(rec.status, CampaignStatus::Failed);
        assert!(rec.completed_at.is_some());

        let mut rec = CampaignRecord::new(2, "acme.io");
        rec.network_connections_sent = 1;
        rec.finish();
        assert_eq!(rec.status, CampaignStatus::Completed);
    }

    #[test]
    fn record_serializes_lowercase_status() {
        let rec = CampaignRecord::new(7, "acme.io");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["id"], 7);
        assert!(json["completed_at"].is_null());
    }
}
