//! Splitting scraped addresses into people and role mailboxes.

use crate::llm::KeyRing;
use outreach_contacts::{classify_by_rules, is_generic, looks_personal, local_part, Person};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a classification was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Llm,
    Rules,
}

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub people: Vec<Person>,
    pub generic: Vec<String>,
    pub analysis: String,
    pub method: Method,
}

impl Classification {
    fn rules(emails: &[String]) -> Self {
        let (people, generic) = classify_by_rules(emails);
        let analysis = format!(
            "Rule-based filtering: {} potential people, {} support emails",
            people.len(),
            generic.len()
        );
        Self {
            people,
            generic,
            analysis,
            method: Method::Rules,
        }
    }
}

pub struct Classifier {
    llm: Option<Arc<KeyRing>>,
}

impl Classifier {
    /// An empty key ring counts as no LLM.
    pub fn new(llm: Option<Arc<KeyRing>>) -> Self {
        Self {
            llm: llm.filter(|ring| !ring.is_empty()),
        }
    }

    pub fn rules_only() -> Self {
        Self { llm: None }
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn classify(&self, emails: &[String], domain: &str) -> Classification {
        if emails.is_empty() {
            return Classification {
                people: Vec::new(),
                generic: Vec::new(),
                analysis: "No emails to filter".to_string(),
                method: Method::Rules,
            };
        }

        let Some(ring) = &self.llm else {
            debug!("No LLM configured, classifying by rules");
            return Classification::rules(emails);
        };

        info!("Classifying {} addresses for {} with the LLM", emails.len(), domain);
        let reply = match ring
            .generate(&prompt(emails, domain), |t| t.contains('{') && t.contains('}'))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("LLM classification failed ({}), using rules", e);
                return Classification::rules(emails);
            }
        };

        match parse_verdict(&reply) {
            Ok(verdict) => {
                let result = reconcile(emails, verdict);
                info!(
                    "LLM found {} people and {} generic addresses",
                    result.people.len(),
                    result.generic.len()
                );
                result
            }
            Err(e) => {
                warn!("Could not parse LLM classification: {}", e);
                debug!("Raw reply: {}", reply.chars().take(200).collect::<String>());
                Classification::rules(emails)
            }
        }
    }
}

fn prompt(emails: &[String], domain: &str) -> String {
    let list: String = emails.iter().map(|e| format!("- {}\n", e)).collect();
    format!(
        r#"Analyze these email addresses from {domain} and:
1. Categorize them into REAL PEOPLE vs SUPPORT/GENERIC emails
2. Extract the actual NAMES from the real people emails

REAL PEOPLE emails are:
- Personal names (john.smith@, sarah.johnson@, m.chen@)
- Individual employees who could be decision makers or potential leads
- People who might respond to business outreach

SUPPORT/GENERIC emails are:
- Customer service (support@, help@, info@, contact@)
- HR/recruiting (hr@, careers@, jobs@, recruiting@)
- General departments (sales@, marketing@, admin@)
- System/automated emails (noreply@, donotreply@, automated@)
- Generic roles (webmaster@, postmaster@, admin@)

For REAL PEOPLE emails, extract the likely full name from the email address:
- john.smith@company.com -> "John Smith"
- sarah.j@company.com -> "Sarah J"
- m.chen@company.com -> "M Chen"
- robert.johnson123@company.com -> "Robert Johnson"
- daveburnisonms@company.com -> "Dave Burnison"
- kunfei@company.com -> "Kun Fei"
- vanessaperson@company.com -> "Vanessa Person"

Break concatenated names appropriately and capitalize properly.

Email addresses to analyze:
{list}
Respond in this exact JSON format:
{{
    "real_people": [
        {{"email": "john.smith@company.com", "name": "John Smith"}}
    ],
    "support_emails": ["support@company.com", "hr@company.com"],
    "analysis": "Brief explanation of filtering decisions"
}}
"#
    )
}

#[derive(Debug, Deserialize)]
struct Verdict {
    #[serde(default)]
    real_people: Vec<PersonEntry>,
    #[serde(default)]
    support_emails: Vec<String>,
    #[serde(default)]
    analysis: String,
}

/// The model answers with either `{email, name}` objects or bare addresses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersonEntry {
    Named {
        email: String,
        #[serde(default)]
        name: String,
    },
    Bare(String),
}

/// The JSON object between the first `{` and the last `}`.
fn parse_verdict(reply: &str) -> Result<Verdict, String> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Err("no JSON object in response".to_string());
    };
    if end < start {
        return Err("no JSON object in response".to_string());
    }
    serde_json::from_str(&reply[start..=end]).map_err(|e| e.to_string())
}

enum Decision {
    Person(String),
    Generic,
}

/// Apply the model's verdict to the input list. Addresses the model invented
/// are dropped, addresses it skipped go through the rules, and an address
/// the model put in both buckets is treated as generic.
fn reconcile(emails: &[String], verdict: Verdict) -> Classification {
    let mut decisions: HashMap<String, Decision> = HashMap::new();
    for entry in verdict.real_people {
        let (email, name) = match entry {
            PersonEntry::Named { email, name } => (email, name),
            PersonEntry::Bare(email) => (email, String::new()),
        };
        decisions.insert(email.trim().to_lowercase(), Decision::Person(name.trim().to_string()));
    }
    for email in verdict.support_emails {
        decisions.insert(email.trim().to_lowercase(), Decision::Generic);
    }

    let mut people = Vec::new();
    let mut generic = Vec::new();
    let mut by_rules = 0;

    for email in emails {
        match decisions.get(&email.trim().to_lowercase()) {
            Some(Decision::Person(name)) if !name.is_empty() => {
                people.push(Person::new(email.clone(), name.clone()))
            }
            Some(Decision::Person(_)) => people.push(Person::from_email(email.clone())),
            Some(Decision::Generic) => generic.push(email.clone()),
            None => {
                by_rules += 1;
                if is_generic(email) || !looks_personal(local_part(email)) {
                    generic.push(email.clone());
                } else {
                    people.push(Person::from_email(email.clone()));
                }
            }
        }
    }

    if by_rules > 0 {
        debug!("{} addresses not covered by the LLM, classified by rules", by_rules);
    }

    Classification {
        people,
        generic,
        analysis: verdict.analysis,
        method: Method::Llm,
    }
}
