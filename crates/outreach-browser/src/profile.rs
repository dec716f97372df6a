use crate::params::{render, Params};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const LEAD_SEARCH_YAML: &str = include_str!("../profiles/lead_search.yaml");
const NETWORK_YAML: &str = include_str!("../profiles/network.yaml");

/// The third-party sites a campaign drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    LeadSearch,
    Network,
}

impl Site {
    /// File name of the profile inside an override directory.
    pub fn profile_file(self) -> &'static str {
        match self {
            Site::LeadSearch => "lead_search.yaml",
            Site::Network => "network.yaml",
        }
    }

    /// File name of the cookie jar inside the cookie directory.
    pub fn cookie_file(self) -> &'static str {
        match self {
            Site::LeadSearch => "lead_search_cookies.json",
            Site::Network => "network_cookies.json",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Site::LeadSearch => "lead-search",
            Site::Network => "network",
        })
    }
}

impl FromStr for Site {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "lead-search" => Ok(Site::LeadSearch),
            "network" => Ok(Site::Network),
            other => Err(format!(
                "unknown site '{}', expected 'lead-search' or 'network'",
                other
            )),
        }
    }
}

/// Keys a flow needs from a profile, checked once when the flow is built.
#[derive(Debug, Clone, Copy)]
pub struct ProfileKeys {
    pub urls: &'static [&'static str],
    pub selectors: &'static [&'static str],
    pub markers: &'static [&'static str],
    pub timings: &'static [&'static str],
    pub limits: &'static [&'static str],
}

/// URLs, selector fallbacks, text markers and timings for one site.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteProfile {
    pub name: String,

    /// Where an operator logs in by hand.
    pub login_url: String,

    /// URL templates with `${param}` placeholders.
    #[serde(default)]
    pub urls: HashMap<String, String>,

    /// Ordered CSS selector fallbacks.
    #[serde(default)]
    pub selectors: HashMap<String, Vec<String>>,

    /// Text looked for in page content, URLs and button labels.
    #[serde(default)]
    pub markers: HashMap<String, Vec<String>>,

    /// Durations in milliseconds.
    #[serde(default)]
    pub timings: HashMap<String, u64>,

    #[serde(default)]
    pub limits: HashMap<String, usize>,
}

impl SiteProfile {
    pub fn parse(yaml: &str) -> Result<Self> {
        let profile: SiteProfile = serde_yaml::from_str(yaml)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// The profile embedded in the binary.
    pub fn builtin(site: Site) -> Result<Self> {
        match site {
            Site::LeadSearch => Self::parse(LEAD_SEARCH_YAML),
            Site::Network => Self::parse(NETWORK_YAML),
        }
    }

    /// Load `dir/<site file>` when it exists, the built-in profile otherwise.
    pub fn resolve(site: Site, dir: Option<&Path>) -> Result<Self> {
        if let Some(dir) = dir {
            let path = dir.join(site.profile_file());
            if path.exists() {
                info!("Using {} profile from {}", site, path.display());
                return Self::load(&path);
            }
        }
        Self::builtin(site)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("name is required".into()));
        }
        if self.login_url.trim().is_empty() {
            return Err(Error::Config(format!("{}: login_url is required", self.name)));
        }
        for (key, list) in &self.selectors {
            if list.iter().any(|s| s.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "{}: selectors.{} contains an empty selector",
                    self.name, key
                )));
            }
        }
        Ok(())
    }

    /// Fail with a descriptive error unless every key is present and usable.
    pub fn check_keys(&self, keys: &ProfileKeys) -> Result<()> {
        let missing = |section: &str, key: &str| {
            Error::Config(format!("{}: missing {}.{}", self.name, section, key))
        };
        for key in keys.urls {
            if !self.urls.contains_key(*key) {
                return Err(missing("urls", key));
            }
        }
        for key in keys.selectors {
            if self.selectors.get(*key).map_or(true, |v| v.is_empty()) {
                return Err(missing("selectors", key));
            }
        }
        for key in keys.markers {
            if self.markers.get(*key).map_or(true, |v| v.is_empty()) {
                return Err(missing("markers", key));
            }
        }
        for key in keys.timings {
            if !self.timings.contains_key(*key) {
                return Err(missing("timings", key));
            }
        }
        for key in keys.limits {
            if !self.limits.contains_key(*key) {
                return Err(missing("limits", key));
            }
        }
        Ok(())
    }

    /// Render the URL template stored under `key`.
    pub fn url(&self, key: &str, params: &Params) -> Result<String> {
        let template = self
            .urls
            .get(key)
            .ok_or_else(|| Error::Config(format!("{}: missing urls.{}", self.name, key)))?;
        render(template, params)
    }

    pub fn selectors(&self, key: &str) -> &[String] {
        self.selectors.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn markers(&self, key: &str) -> &[String] {
        self.markers.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn timing(&self, key: &str) -> Result<Duration> {
        self.timings
            .get(key)
            .map(|ms| Duration::from_millis(*ms))
            .ok_or_else(|| Error::Config(format!("{}: missing timings.{}", self.name, key)))
    }

    pub fn limit(&self, key: &str) -> Result<usize> {
        self.limits
            .get(key)
            .copied()
            .ok_or_else(|| Error::Config(format!("{}: missing limits.{}", self.name, key)))
    }

    /// Whether any of the `key` markers occurs in `haystack`, ignoring case.
    pub fn has_marker(&self, key: &str, haystack: &str) -> bool {
        let haystack = haystack.to_lowercase();
        self.markers(key)
            .iter()
            .any(|m| haystack.contains(&m.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LeadSearch, Network};

    #[test]
    fn builtin_profiles_parse_and_satisfy_flows() {
        let lead = SiteProfile::builtin(Site::LeadSearch).unwrap();
        assert_eq!(lead.name, "lead-search");
        lead.check_keys(&LeadSearch::KEYS).unwrap();

        let network = SiteProfile::builtin(Site::Network).unwrap();
        assert_eq!(network.name, "network");
        network.check_keys(&Network::KEYS).unwrap();
        assert_eq!(network.limit("max_people").unwrap(), 10);
        assert_eq!(network.limit("cards_checked").unwrap(), 3);
        assert_eq!(
            network.timing("connection_delay").unwrap(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn url_templates_render() {
        let network = SiteProfile::builtin(Site::Network).unwrap();
        let url = network
            .url("search", &Params::new().set("query", "Jane+Doe+Acme"))
            .unwrap();
        assert_eq!(
            url,
            "https://www.linkedin.com/search/results/people/?keywords=Jane+Doe+Acme"
        );
        assert!(network.url("search", &Params::new()).is_err());
        assert!(network.url("nope", &Params::new()).is_err());
    }

    #[test]
    fn email_selectors_keep_their_order() {
        let lead = SiteProfile::builtin(Site::LeadSearch).unwrap();
        let sels = lead.selectors("emails");
        assert_eq!(sels.first().map(String::as_str), Some("span.text-heading.text-md.font-light"));
        assert_eq!(sels.last().map(String::as_str), Some("div"));
        assert!(lead.selectors("missing").is_empty());
    }

    #[test]
    fn markers_ignore_case() {
        let network = SiteProfile::builtin(Site::Network).unwrap();
        assert!(network.has_marker("sent", "<div>INVITATION SENT</div>"));
        assert!(network.has_marker("logged_in_url", "https://www.linkedin.com/feed/"));
        assert!(!network.has_marker("logged_in_url", "https://www.linkedin.com/login"));
    }

    #[test]
    fn validation_errors() {
        assert!(SiteProfile::parse("name: ''\nlogin_url: 'x'").is_err());
        assert!(SiteProfile::parse("name: x\nlogin_url: ''").is_err());
        let err = SiteProfile::parse("name: x\nlogin_url: y\nselectors:\n  a: ['']").unwrap_err();
        assert!(err.to_string().contains("selectors.a"));
    }

    #[test]
    fn check_keys_names_the_gap() {
        let minimal = SiteProfile::parse("name: bare\nlogin_url: https://x.io").unwrap();
        let err = minimal.check_keys(&Network::KEYS).unwrap_err();
        assert!(err.to_string().starts_with("config error: bare: missing"));
    }

    #[test]
    fn resolve_prefers_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("network.yaml"),
            "name: custom-network\nlogin_url: https://example.com/login\n",
        )
        .unwrap();

        let custom = SiteProfile::resolve(Site::Network, Some(dir.path())).unwrap();
        assert_eq!(custom.name, "custom-network");

        // no override file for this site
        let lead = SiteProfile::resolve(Site::LeadSearch, Some(dir.path())).unwrap();
        assert_eq!(lead.name, "lead-search");
    }

    #[test]
    fn site_names_round_trip() {
        assert_eq!("lead-search".parse::<Site>().unwrap(), Site::LeadSearch);
        assert_eq!("Lead_Search".parse::<Site>().unwrap(), Site::LeadSearch);
        assert_eq!(Site::Network.to_string(), "network");
        assert!("gmail".parse::<Site>().is_err());
    }
}
