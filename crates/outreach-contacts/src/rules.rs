use crate::extract::local_part;
use crate::Person;

/// A named group of role-based local parts.
#[derive(Debug, Clone, Copy)]
pub struct GenericRule {
    pub name: &'static str,
    pub locals: &'static [&'static str],
}

/// Role mailboxes that never belong to an individual.
pub const GENERIC_RULES: &[GenericRule] = &[
    GenericRule {
        name: "customer service",
        locals: &["support", "help", "info", "contact", "customer", "service"],
    },
    GenericRule {
        name: "recruiting",
        locals: &["hr", "careers", "jobs", "recruiting", "talent"],
    },
    GenericRule {
        name: "department",
        locals: &["sales", "marketing", "admin", "office"],
    },
    GenericRule {
        name: "automated",
        locals: &["noreply", "donotreply", "no-reply", "automated"],
    },
    GenericRule {
        name: "mail system",
        locals: &["webmaster", "postmaster", "mail", "email"],
    },
    GenericRule {
        name: "finance",
        locals: &["billing", "accounting", "finance"],
    },
    GenericRule {
        name: "legal",
        locals: &["legal", "compliance", "security"],
    },
    GenericRule {
        name: "infrastructure",
        locals: &["it", "tech", "system", "server"],
    },
];

/// The rule an address falls under, if any.
pub fn generic_rule(email: &str) -> Option<&'static GenericRule> {
    let local = local_part(email).to_lowercase();
    GENERIC_RULES
        .iter()
        .find(|rule| rule.locals.contains(&local.as_str()))
}

/// Whether the address is a role/automated mailbox.
pub fn is_generic(email: &str) -> bool {
    generic_rule(email).is_some()
}

/// Whether a local part has the shape of a personal mailbox.
pub fn looks_personal(local: &str) -> bool {
    local.contains('.') || local.contains('_') || local.chars().count() > 3
}

/// Split addresses into people and generic mailboxes using static rules only.
///
/// Every input address lands in exactly one of the two lists.
pub fn classify_by_rules(emails: &[String]) -> (Vec<Person>, Vec<String>) {
    let mut people = Vec::new();
    let mut generic = Vec::new();

    for email in emails {
        let local = local_part(email).to_lowercase();
        if is_generic(email) || !looks_personal(&local) {
            generic.push(email.clone());
        } else {
            people.push(Person::from_email(email.clone()));
        }
    }

    (people, generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn role_mailboxes_are_generic() {
        for e in [
            "support@x.io",
            "NoReply@x.io",
            "no-reply@x.io",
            "careers@x.io",
            "postmaster@x.io",
            "it@x.io",
        ] {
            assert!(is_generic(e), "{e} should be generic");
        }
    }

    #[test]
    fn prefix_of_role_word_is_not_generic() {
        // "supporter" or "infonet" are not the role word itself
        assert!(!is_generic("supporter@x.io"));
        assert!(!is_generic("itzel.ramos@x.io"));
    }

    #[test]
    fn generic_rule_names_group() {
        assert_eq!(generic_rule("billing@x.io").unwrap().name, "finance");
        assert!(generic_rule("john@x.io").is_none());
    }

    #[test]
    fn short_locals_are_not_personal() {
        assert!(!looks_personal("abc"));
        assert!(looks_personal("a.b"));
        assert!(looks_personal("a_b"));
        assert!(looks_personal("kunf"));
    }

    #[test]
    fn classify_partitions_every_address() {
        let emails = owned(&[
            "john.smith@acme.io",
            "support@acme.io",
            "bob@acme.io",
            "daveburnisonms@acme.io",
            "jo@acme.io",
        ]);
        let (people, generic) = classify_by_rules(&emails);

        let names: Vec<&str> = people.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["John Smith", "Daveburnison Ms"]);
        assert_eq!(generic, owned(&["support@acme.io", "bob@acme.io", "jo@acme.io"]));
        assert_eq!(people.len() + generic.len(), emails.len());
    }

    #[test]
    fn classify_empty() {
        let (people, generic) = classify_by_rules(&[]);
        assert!(people.is_empty());
        assert!(generic.is_empty());
    }
}
