use super::{
    BrowserContacts, BrowserSocial, CampaignRequest, CampaignStore, ContactSource, SocialOutreach,
};
use crate::classify::{Classification, Classifier};
use crate::compose::{load_resume, Composer, Persona};
use crate::config::Settings;
use crate::Result;
use outreach_browser::{LeadSearch, Network, Site, SiteProfile};
use outreach_contacts::{clean_domain, company_name, greeting_name, Person};
use outreach_mail::{Mailer, OutgoingEmail};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Runs campaigns: one background task per launch, results in the store.
pub struct Orchestrator {
    store: Arc<CampaignStore>,
    source: Arc<dyn ContactSource>,
    social: Arc<dyn SocialOutreach>,
    classifier: Classifier,
    composer: Composer,
    mailer: Arc<Mailer>,
    resume_path: PathBuf,
    email_delay: Duration,
    social_people: usize,
    max_connections: usize,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn ContactSource>,
        social: Arc<dyn SocialOutreach>,
        classifier: Classifier,
        composer: Composer,
        mailer: Mailer,
    ) -> Self {
        Self {
            store: Arc::new(CampaignStore::new()),
            source,
            social,
            classifier,
            composer,
            mailer: Arc::new(mailer),
            resume_path: PathBuf::from("resume.txt"),
            email_delay: Duration::from_secs(2),
            social_people: 10,
            max_connections: 5,
        }
    }

    /// Wire the browser flows, LLM key ring, persona and SMTP providers
    /// described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let ring = settings.key_ring()?.map(Arc::new);

        let persona = match &settings.persona_path {
            Some(path) => Persona::load(path)?,
            None => Persona::builtin()?,
        };

        let profiles = settings.profile_dir.as_deref();
        let search = LeadSearch::new(SiteProfile::resolve(Site::LeadSearch, profiles)?)?;
        let network = Network::new(SiteProfile::resolve(Site::Network, profiles)?)?;

        let source = BrowserContacts::new(search, settings.browser_options(Site::LeadSearch));
        let social = BrowserSocial::new(network, settings.browser_options(Site::Network));

        Ok(Self::new(
            Arc::new(source),
            Arc::new(social),
            Classifier::new(ring.clone()),
            Composer::new(persona, ring),
            Mailer::new(settings.smtp_providers()),
        )
        .resume_path(settings.resume_path.clone()))
    }

    pub fn resume_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.resume_path = path.into();
        self
    }

    /// Pause after each successful send.
    pub fn email_delay(mut self, delay: Duration) -> Self {
        self.email_delay = delay;
        self
    }

    pub fn store(&self) -> &CampaignStore {
        &self.store
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    pub fn load_resume(&self) -> String {
        load_resume(&self.resume_path)
    }

    /// Scrape and classify the addresses of `domain`.
    pub async fn discover(&self, domain: &str) -> Result<Classification> {
        let raw = self.source.raw_emails(domain).await?;
        info!("{} raw addresses for {}", raw.len(), domain);
        Ok(self.classifier.classify(&raw, domain).await)
    }

    /// Validate, record and start a campaign. The id is returned before the
    /// work begins.
    pub fn launch(self: &Arc<Self>, request: CampaignRequest) -> Result<u64> {
        request.validate()?;
        let id = self.store.create(request.domain());
        info!("Launching campaign {} for {}", id, request.domain());

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(id, request).await;
        });
        Ok(id)
    }

    async fn run(&self, id: u64, request: CampaignRequest) {
        let Some(domain) = clean_domain(request.domain()) else {
            warn!("Campaign {}: invalid domain '{}'", id, request.domain());
            self.store.update(id, |r| r.fail("Invalid domain"));
            return;
        };
        let company = company_name(&domain);

        let resume = self.load_resume();
        let paragraph = self
            .composer
            .personalized_paragraph(&resume, &request.job_description)
            .await
            .body;

        let people = match self.discover(&domain).await {
            Ok(found) => {
                let count = found.people.len();
                info!("Campaign {}: {} people at {}", id, count, company);
                self.store.update(id, |r| r.emails_found = count);
                found.people
            }
            Err(e) => {
                let phase = if request.email_enabled { "Email" } else { "Social" };
                error!("Campaign {}: discovery failed: {}", id, e);
                self.store
                    .update(id, |r| r.errors.push(format!("{} error: {}", phase, e)));
                Vec::new()
            }
        };

        if request.email_enabled && !people.is_empty() {
            self.email_phase(id, &people, &company, &paragraph, request.target_email_count)
                .await;
        }

        if request.social_enabled {
            self.social_phase(id, &people, &company).await;
        }

        self.store.update(id, |r| r.finish());
        if let Some(rec) = self.store.get(id) {
            info!(
                "Campaign {} {:?}: emails {}/{}, connections {}/{}",
                id,
                rec.status,
                rec.emails_sent,
                rec.emails_found,
                rec.network_connections_sent,
                rec.network_people_found
            );
        }
    }

    async fn email_phase(
        &self,
        id: u64,
        people: &[Person],
        company: &str,
        paragraph: &str,
        target: usize,
    ) {
        info!("Campaign {}: emailing up to {} people", id, target);
        for person in people.iter().take(target) {
            let first = greeting_name(&person.name);
            let draft = self.composer.draft(company, first.as_deref(), paragraph);
            let email = OutgoingEmail::new(&person.email, draft.subject, draft.body);

            match self.mailer.send(&email).await {
                Ok(_) => {
                    self.store.update(id, |r| r.emails_sent += 1);
                    if !self.email_delay.is_zero() {
                        tokio::time::sleep(self.email_delay).await;
                    }
                }
                Err(e) => warn!("Failed to send email to {}: {}", person.email, e),
            }
        }
    }

    async fn social_phase(&self, id: u64, people: &[Person], company: &str) {
        if people.is_empty() {
            info!("Campaign {}: no people to look up on the network", id);
            return;
        }

        let targets = &people[..people.len().min(self.social_people)];
        info!("Campaign {}: looking up {} people on the network", id, targets.len());
        match self
            .social
            .reach(targets, company, self.max_connections)
            .await
        {
            Ok(outcomes) => {
                let connected = outcomes.iter().filter(|o| o.connected).count();
                self.store.update(id, |r| {
                    r.network_people_found = outcomes.len();
                    r.network_connections_sent = connected;
                });
            }
            Err(e) => {
                error!("Campaign {}: network outreach failed: {}", id, e);
                self.store
                    .update(id, |r| r.errors.push(format!("Social error: {}", e)));
            }
        }
    }
}
