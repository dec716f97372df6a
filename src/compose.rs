//! Message drafting: an LLM-written paragraph in the sender's voice, with
//! canned paragraphs when the LLM is missing or its output is not usable.

use crate::llm::KeyRing;
use crate::{Error, Result};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PERSONA_YAML: &str = include_str!("../config/persona.yaml");

/// Generated text shorter than this is not used.
const MIN_GENERATED_LEN: usize = 200;

/// The sender the messages are written as.
#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub sender_name: String,
    pub intro: String,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    pub ask: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub canned: Vec<String>,
}

impl Persona {
    pub fn parse(yaml: &str) -> Result<Self> {
        let persona: Persona = serde_yaml::from_str(yaml)?;
        persona.validate()?;
        Ok(persona)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(PERSONA_YAML)
    }

    fn validate(&self) -> Result<()> {
        if self.sender_name.trim().is_empty() {
            return Err(Error::Config("persona: sender_name is required".into()));
        }
        if self.intro.trim().is_empty() || self.ask.trim().is_empty() {
            return Err(Error::Config("persona: intro and ask are required".into()));
        }
        if self.canned.iter().all(|p| p.trim().is_empty()) {
            return Err(Error::Config(
                "persona: at least one canned paragraph is required".into(),
            ));
        }
        Ok(())
    }
}

/// Resume text, or an empty string when the file cannot be read.
pub fn load_resume(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Resume file not found: {}", path.display());
            String::new()
        }
        Err(e) => {
            warn!("Error loading resume {}: {}", path.display(), e);
            String::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Llm,
    Canned,
}

#[derive(Debug, Clone)]
pub struct Composed {
    pub body: String,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

pub struct Composer {
    persona: Persona,
    llm: Option<Arc<KeyRing>>,
}

impl Composer {
    pub fn new(persona: Persona, llm: Option<Arc<KeyRing>>) -> Self {
        Self {
            persona,
            llm: llm.filter(|ring| !ring.is_empty()),
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// One of the persona's canned paragraphs, picked at random.
    pub fn canned(&self) -> String {
        let choices: Vec<&String> = self
            .persona
            .canned
            .iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        choices
            .choose(&mut rand::rng())
            .map(|p| p.trim().to_string())
            .unwrap_or_default()
    }

    /// The opening paragraph for every message of a campaign.
    pub async fn personalized_paragraph(&self, resume: &str, job_description: &str) -> Composed {
        let canned = || Composed {
            body: self.canned(),
            source: Source::Canned,
        };

        let Some(ring) = &self.llm else {
            debug!("No LLM configured, using a canned paragraph");
            return canned();
        };
        if resume.trim().is_empty() || job_description.trim().is_empty() {
            debug!("Resume or job description missing, using a canned paragraph");
            return canned();
        }

        let sender = self.persona.sender_name.as_str();
        let accept =
            |text: &str| text.chars().count() > MIN_GENERATED_LEN && text.contains(sender);
        match ring.generate(&self.prompt(job_description), accept).await {
            Ok(body) => {
                info!("Generated a personalized paragraph");
                Composed {
                    body,
                    source: Source::Llm,
                }
            }
            Err(e) => {
                warn!("All LLM keys failed ({}), using a canned paragraph", e);
                canned()
            }
        }
    }

    fn prompt(&self, job_description: &str) -> String {
        let p = &self.persona;
        let highlights: String = p.highlights.iter().map(|h| format!("- {}\n", h)).collect();
        let portfolio = match &p.portfolio_url {
            Some(url) => format!(
                "5. **Portfolio**: Natural mention: \"Here's some of my work: {}\"\n",
                url
            ),
            None => String::new(),
        };

        format!(
            r#"You are writing a cold outreach email for {name} to a tech company. Follow this EXACT structure and tone:

STRUCTURE (6-8 sentences total):
1. **Hook**: One short, witty sentence about their product/industry pain point
2. **Intro**: "{intro}"
3. **Knowledge**: 1-2 sentences showing you know what they do (be specific)
4. **Value**: 1-2 sentences on relevant skills/experience that could help them
{portfolio}6. **Ask**: "{ask}"

TONE: Casual, confident, not salesy. No buzzwords or jargon.

RESUME HIGHLIGHTS TO USE:
{highlights}
COMPANY INFO:
{job_description}

Generate the complete email following this structure. Keep it conversational and specific to their company/role:"#,
            name = p.sender_name,
            intro = p.intro,
            ask = p.ask,
        )
    }

    pub fn subject(company: &str) -> String {
        format!("Quick question about opportunities at {}", company)
    }

    /// Subject and body for one recipient. The greeting is added only when
    /// a first name is known.
    pub fn draft(&self, company: &str, first_name: Option<&str>, paragraph: &str) -> Draft {
        let body = match first_name {
            Some(name) if !name.trim().is_empty() => format!("Hi {},\n\n{}", name.trim(), paragraph),
            _ => paragraph.to_string(),
        };
        Draft {
            subject: Self::subject(company),
            body,
        }
    }
}
