use crate::params::{encode_component, Params};
use crate::profile::{ProfileKeys, SiteProfile};
use crate::session::BrowserSession;
use crate::{Error, Result};
use outreach_contacts::{names_match, search_name, Person};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

const CARD_ATTR: &str = "data-outreach-card";
const BUTTONS: &str = "button, [role='button']";

/// What happened for one person whose profile was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonOutcome {
    pub email: String,
    /// Name the search was run with.
    pub name: String,
    pub profile_url: Option<String>,
    pub connected: bool,
}

struct Found {
    profile_url: Option<String>,
    connected: bool,
}

/// Finds people on the professional network and sends connection requests.
pub struct Network {
    profile: SiteProfile,
}

impl Network {
    pub const KEYS: ProfileKeys = ProfileKeys {
        urls: &["home", "search"],
        selectors: &[
            "results",
            "cards",
            "card_name",
            "card_link",
            "dropdown_connect",
            "dropdown_items",
            "modal",
            "dismiss",
        ],
        markers: &[
            "connect",
            "message",
            "more",
            "send",
            "sent",
            "logged_in_url",
            "logged_in_page",
        ],
        timings: &[
            "page_settle",
            "results_timeout",
            "modal_timeout",
            "action_delay",
            "connection_delay",
            "search_delay",
            "login_wait",
            "login_poll",
        ],
        limits: &["max_people", "cards_checked"],
    };

    pub fn new(profile: SiteProfile) -> Result<Self> {
        profile.check_keys(&Self::KEYS)?;
        Ok(Self { profile })
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Search for each person (up to the profile's `max_people`) and try to
    /// connect, stopping after `max_connections` requests.
    pub async fn reach(
        &self,
        session: &BrowserSession,
        people: &[Person],
        company: &str,
        max_connections: usize,
    ) -> Result<Vec<PersonOutcome>> {
        let p = &self.profile;
        self.ensure_logged_in(session).await?;

        let mut outcomes = Vec::new();
        let mut connections = 0;

        for person in people.iter().take(p.limit("max_people")?) {
            if connections >= max_connections {
                break;
            }
            let Some(name) = search_name(&person.email) else {
                debug!("No searchable name in {}", person.email);
                continue;
            };

            info!("Searching for {} at {}", name, company);
            match self.search_and_connect(session, &name, company).await {
                Ok(Some(found)) => {
                    if found.connected {
                        connections += 1;
                        info!("Connection request sent to {}", name);
                        session.pause(p.timing("connection_delay")?).await;
                    }
                    outcomes.push(PersonOutcome {
                        email: person.email.clone(),
                        name,
                        profile_url: found.profile_url,
                        connected: found.connected,
                    });
                }
                Ok(None) => info!("No matching profile for {}", name),
                Err(e) => warn!("Search failed for {}: {}", name, e),
            }

            session.pause(p.timing("search_delay")?).await;
        }

        info!(
            "{}: {} people found, {} connection requests sent",
            p.name,
            outcomes.len(),
            connections
        );
        Ok(outcomes)
    }

    async fn is_logged_in(&self, session: &BrowserSession) -> Result<bool> {
        let p = &self.profile;
        if p.has_marker("logged_in_url", &session.url().await?) {
            return Ok(true);
        }
        Ok(p.has_marker("logged_in_page", &session.html().await?))
    }

    /// Open the home page; if the session is not authenticated, wait for an
    /// operator to log in and keep the resulting cookies.
    async fn ensure_logged_in(&self, session: &BrowserSession) -> Result<()> {
        let p = &self.profile;
        session.goto(&p.url("home", &Params::new())?).await?;
        session.pause(p.timing("page_settle")?).await;

        if self.is_logged_in(session).await? {
            info!("{} session is active", p.name);
            return Ok(());
        }

        let wait = p.timing("login_wait")?;
        warn!(
            "{} login required. Log in in the browser window (waiting up to {:?})",
            p.name, wait
        );
        let deadline = Instant::now() + wait;
        while Instant::now() < deadline {
            session.pause(p.timing("login_poll")?).await;
            if self.is_logged_in(session).await? {
                info!("{} login detected", p.name);
                if let Err(e) = session.save_cookies().await {
                    debug!("Cookies not saved: {}", e);
                }
                return Ok(());
            }
        }
        Err(Error::LoginRequired(p.name.clone()))
    }

    async fn search_and_connect(
        &self,
        session: &BrowserSession,
        name: &str,
        company: &str,
    ) -> Result<Option<Found>> {
        let p = &self.profile;
        let query = encode_component(&format!("{} {}", name, company));
        session
            .goto(&p.url("search", &Params::new().set("query", query))?)
            .await?;
        session.pause(p.timing("page_settle")?).await;

        if session
            .wait_for_any(p.selectors("results"), p.timing("results_timeout")?)
            .await?
            .is_none()
        {
            debug!("Search results container never appeared, continuing");
        }

        let cards = session.mark_all(p.selectors("cards"), CARD_ATTR).await?;
        if cards == 0 {
            debug!("No result cards for {}", name);
            return Ok(None);
        }
        debug!("{} result cards", cards);

        for idx in 0..cards.min(p.limit("cards_checked")?) {
            let scope = format!("[{}=\"{}\"]", CARD_ATTR, idx);
            let Some(found_name) = session.text_in(&scope, p.selectors("card_name")).await? else {
                continue;
            };
            debug!("Result {}: {}", idx + 1, found_name);
            if !names_match(name, &found_name) {
                continue;
            }

            info!("Matching profile: {}", found_name);
            let profile_url = session.attr_in(&scope, p.selectors("card_link"), "href").await?;
            let connected = self
                .connect_from_card(session, &scope, profile_url.as_deref())
                .await?;
            return Ok(Some(Found {
                profile_url,
                connected,
            }));
        }

        Ok(None)
    }

    /// Direct Connect, else Message (connect from the profile page), else
    /// the More menu.
    async fn connect_from_card(
        &self,
        session: &BrowserSession,
        scope: &str,
        profile_url: Option<&str>,
    ) -> Result<bool> {
        let p = &self.profile;

        if let Some(connect) = session
            .find_by_label(Some(scope), BUTTONS, p.markers("connect"))
            .await?
        {
            debug!("Direct Connect button");
            session.click(&connect).await?;
            session.pause(p.timing("action_delay")?).await;
            return self.send_invitation(session).await;
        }

        if session
            .find_by_label(Some(scope), BUTTONS, p.markers("message"))
            .await?
            .is_some()
        {
            if let Some(url) = profile_url {
                debug!("Only Message offered, visiting profile");
                return self.connect_from_profile(session, url).await;
            }
        }

        if let Some(more) = session
            .find_by_label(Some(scope), BUTTONS, p.markers("more"))
            .await?
        {
            debug!("Expanding More menu");
            session.click(&more).await?;
            session.pause(p.timing("action_delay")?).await;
            if self.click_dropdown_connect(session).await? {
                return self.send_invitation(session).await;
            }
        }

        warn!("No Connect option on this result");
        Ok(false)
    }

    async fn connect_from_profile(&self, session: &BrowserSession, url: &str) -> Result<bool> {
        let p = &self.profile;
        session.goto(url).await?;
        session.pause(p.timing("page_settle")?).await;

        if let Some(connect) = session
            .find_by_label(None, "button", p.markers("connect"))
            .await?
        {
            session.click(&connect).await?;
            session.pause(p.timing("action_delay")?).await;
            return self.send_invitation(session).await;
        }

        if let Some(more) = session
            .find_by_label(None, "button", p.markers("more"))
            .await?
        {
            session.click(&more).await?;
            session.pause(p.timing("action_delay")?).await;
            if self.click_dropdown_connect(session).await? {
                return self.send_invitation(session).await;
            }
        }

        warn!("No Connect option on profile page");
        Ok(false)
    }

    async fn click_dropdown_connect(&self, session: &BrowserSession) -> Result<bool> {
        let p = &self.profile;
        let item = match session.first_present(p.selectors("dropdown_connect")).await? {
            Some(sel) => Some(sel),
            None => {
                let candidates = p.selectors("dropdown_items").join(", ");
                session
                    .find_by_label(None, &candidates, p.markers("connect"))
                    .await?
            }
        };

        let Some(item) = item else {
            return Ok(false);
        };
        debug!("Connect found in dropdown");
        session.click(&item).await?;
        session.pause(p.timing("action_delay")?).await;
        Ok(true)
    }

    /// Press Send in the invitation modal.
    async fn send_invitation(&self, session: &BrowserSession) -> Result<bool> {
        let p = &self.profile;
        let Some(modal) = session
            .wait_for_any(p.selectors("modal"), p.timing("modal_timeout")?)
            .await?
        else {
            warn!("Invitation modal not found");
            return Ok(false);
        };

        let send = match session
            .find_by_label(Some(&modal), BUTTONS, p.markers("send"))
            .await?
        {
            Some(sel) => Some(sel),
            None => session.find_by_label(None, "button", p.markers("send")).await?,
        };
        let Some(send) = send else {
            warn!("No Send button in invitation modal");
            self.dismiss(session).await;
            return Ok(false);
        };

        session.click(&send).await?;
        session.pause(p.timing("action_delay")?).await;

        if p.has_marker("sent", &session.html().await?) {
            debug!("Invitation confirmed on page");
        } else {
            debug!("Invitation likely sent, no confirmation text");
        }
        Ok(true)
    }

    async fn dismiss(&self, session: &BrowserSession) {
        if let Ok(Some(sel)) = session.first_present(self.profile.selectors("dismiss")).await {
            let _ = session.click(&sel).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Site;

    #[test]
    fn new_checks_profile() {
        assert!(Network::new(SiteProfile::builtin(Site::Network).unwrap()).is_ok());
        let wrong = SiteProfile::builtin(Site::LeadSearch).unwrap();
        let err = Network::new(wrong).err().unwrap();
        assert!(err.to_string().contains("missing urls.home"));
    }

    #[test]
    fn outcome_serializes_profile_url() {
        let outcome = PersonOutcome {
            email: "jane.doe@acme.io".into(),
            name: "Jane Doe".into(),
            profile_url: Some("https://www.linkedin.com/in/janedoe".into()),
            connected: true,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["profile_url"], "https://www.linkedin.com/in/janedoe");
        assert_eq!(json["connected"], true);
    }
}
