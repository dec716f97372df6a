//! # outreach-contacts
//!
//! Heuristics over raw email addresses: which domain they belong to, which
//! ones are role mailboxes, and what the person behind a mailbox is probably
//! called.
//!
//! ## Quick Start
//!
//! ```rust
//! use outreach_contacts::{classify_by_rules, clean_domain, search_name};
//!
//! let domain = clean_domain("https://www.Acme.io/about").unwrap();
//! assert_eq!(domain, "acme.io");
//!
//! let emails = vec!["jane.doe@acme.io".to_string(), "support@acme.io".to_string()];
//! let (people, generic) = classify_by_rules(&emails);
//! assert_eq!(people[0].name, "Jane Doe");
//! assert_eq!(generic, vec!["support@acme.io".to_string()]);
//!
//! assert_eq!(search_name("jane.doe@acme.io").as_deref(), Some("Jane Doe"));
//! ```

mod domain;
mod extract;
mod matching;
mod names;
mod rules;

pub use domain::{clean_domain, company_name};
pub use extract::{extract_emails, is_email, local_part};
pub use matching::names_match;
pub use names::{display_name, greeting_name, search_name};
pub use rules::{classify_by_rules, generic_rule, is_generic, looks_personal, GenericRule, GENERIC_RULES};

use serde::{Deserialize, Serialize};

/// A mailbox believed to belong to an individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub email: String,
    pub name: String,
}

impl Person {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// Person with a name inferred from the address.
    pub fn from_email(email: impl Into<String>) -> Self {
        let email = email.into();
        let name = display_name(&email);
        Self { email, name }
    }
}

/// Title-case a single word: first char upper, rest lower.
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Title-case every alphabetic run, like `"acme-labs"` → `"Acme-Labs"`.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("john"), "John");
        assert_eq!(capitalize("mCDONALD"), "Mcdonald");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("acme-labs"), "Acme-Labs");
        assert_eq!(title_case("jucano"), "Jucano");
        assert_eq!(title_case("o'neil"), "O'Neil");
    }

    #[test]
    fn test_person_from_email() {
        let p = Person::from_email("sarah.johnson@example.com");
        assert_eq!(p.name, "Sarah Johnson");
        assert_eq!(p.email, "sarah.johnson@example.com");
    }

    #[test]
    fn test_person_serializes_flat() {
        let p = Person::new("a.b@x.io", "A B");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["email"], "a.b@x.io");
        assert_eq!(json["name"], "A B");
    }
}
