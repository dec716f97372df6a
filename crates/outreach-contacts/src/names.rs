//! Best-effort human names from mailbox local parts.
//!
//! Two flavours exist because they serve different consumers: `display_name`
//! always produces something printable for a classified person, while
//! `search_name` only answers when the result is plausible enough to type into
//! a people search.

use crate::extract::local_part;
use crate::{capitalize, title_case};
use regex::Regex;
use std::sync::OnceLock;

/// Frequent first names used to split concatenated locals like `michaelgolden`.
const COMMON_FIRST_NAMES: &[&str] = &[
    "james", "john", "robert", "michael", "william", "david", "richard", "thomas", "charles",
    "christopher", "daniel", "matthew", "anthony", "mark", "donald", "steven", "paul", "andrew",
    "joshua", "kenneth", "mary", "patricia", "jennifer", "linda", "elizabeth", "barbara", "susan",
    "jessica", "sarah", "karen", "nancy", "lisa", "betty", "helen", "sandra", "donna", "carol",
    "ruth", "sharon", "michelle",
];

fn separator_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^([a-z]+)\.([a-z]+)$",
            r"^([a-z]+)\.([a-z]+)\.([a-z]+)$",
            r"^([a-z]+)\.([a-z])\.([a-z]+)$",
            r"^([a-z]+)_([a-z]+)$",
            r"^([a-z]+)-([a-z]+)$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("name pattern is valid"))
        .collect()
    })
}

/// Printable name for a classified person.
///
/// `john.smith42@x` → `John Smith`, `sarah_j@x` → `Sarah`, `daveburnisonms@x`
/// → `Daveburnison Ms`. Single-character parts are dropped; if nothing is
/// left the capitalized local part is returned.
pub fn display_name(email: &str) -> String {
    let raw = local_part(email);
    let local = raw.trim_end_matches(|c: char| c.is_ascii_digit());

    let parts: Vec<String> = if local.contains('.') {
        local.split('.').map(str::to_string).collect()
    } else if local.contains('_') {
        local.split('_').map(str::to_string).collect()
    } else {
        split_concatenated(local)
    };

    let name = parts
        .iter()
        .filter(|p| p.chars().count() > 1)
        .map(|p| capitalize(p))
        .collect::<Vec<_>>()
        .join(" ");

    if !name.is_empty() {
        name
    } else if !local.is_empty() {
        capitalize(local)
    } else {
        capitalize(raw)
    }
}

/// Split a concatenated local part into at most two pieces.
fn split_concatenated(local: &str) -> Vec<String> {
    let lower = local.to_lowercase();
    for suffix in ["ms", "jr"] {
        if let Some(head) = lower.strip_suffix(suffix) {
            return vec![head.to_string(), suffix.to_string()];
        }
    }

    let chars: Vec<char> = lower.chars().collect();
    if chars.len() > 6 {
        let mid = chars.len() / 2;
        return vec![
            chars[..mid].iter().collect(),
            chars[mid..].iter().collect(),
        ];
    }
    vec![lower]
}

/// Name to type into a people search, or `None` when the local part does not
/// look like a name at all.
pub fn search_name(email: &str) -> Option<String> {
    let local = local_part(email);
    let lower = local.to_lowercase();

    for pattern in separator_patterns() {
        let Some(caps) = pattern.captures(&lower) else {
            continue;
        };
        let first = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let last = caps
            .get(caps.len() - 1)
            .map(|m| m.as_str())
            .unwrap_or_default();
        if first.len() >= 2 && last.len() >= 2 {
            return Some(format!("{} {}", capitalize(first), capitalize(last)));
        }
    }

    if local.chars().count() >= 4 && local.chars().all(char::is_alphabetic) {
        for first in COMMON_FIRST_NAMES {
            if lower.starts_with(first) && lower.chars().count() > first.len() + 2 {
                let rest = &lower[first.len()..];
                return Some(format!("{} {}", capitalize(first), title_case(rest)));
            }
        }
        return Some(title_case(local));
    }

    None
}

/// First name to greet someone with, when the display name has a given name
/// and a family name.
pub fn greeting_name(display_name: &str) -> Option<String> {
    let mut words = display_name.split_whitespace();
    let first = words.next()?;
    words.next()?;
    if first.chars().count() < 2 {
        return None;
    }
    Some(capitalize(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_dot_and_underscore() {
        assert_eq!(display_name("john.smith@acme.com"), "John Smith");
        assert_eq!(display_name("robert.johnson123@acme.com"), "Robert Johnson");
        assert_eq!(display_name("m_chen@acme.com"), "Chen");
        assert_eq!(display_name("sarah.jo@acme.com"), "Sarah Jo");
    }

    #[test]
    fn display_name_concatenated() {
        assert_eq!(display_name("daveburnisonms@acme.com"), "Daveburnison Ms");
        assert_eq!(display_name("vanessaperson@acme.com"), "Vaness Aperson");
        assert_eq!(display_name("kunfei@acme.com"), "Kunfei");
    }

    #[test]
    fn display_name_degenerate_inputs() {
        assert_eq!(display_name("x@acme.com"), "X");
        assert_eq!(display_name("12345@acme.com"), "12345");
        assert_eq!(display_name(""), "");
        assert_eq!(display_name("élodie.durand@acme.fr"), "Élodie Durand");
    }

    #[test]
    fn search_name_separated() {
        assert_eq!(search_name("john.smith@x.io").as_deref(), Some("John Smith"));
        assert_eq!(search_name("Mary.Ann.Lee@x.io").as_deref(), Some("Mary Lee"));
        assert_eq!(search_name("tom.j.hanks@x.io").as_deref(), Some("Tom Hanks"));
        assert_eq!(search_name("anna_berg@x.io").as_deref(), Some("Anna Berg"));
        assert_eq!(search_name("li-wei@x.io").as_deref(), Some("Li Wei"));
    }

    #[test]
    fn search_name_concatenated() {
        assert_eq!(
            search_name("michaelgolden@x.io").as_deref(),
            Some("Michael Golden")
        );
        assert_eq!(search_name("jucano@x.io").as_deref(), Some("Jucano"));
        // too little left after the first name to be a surname
        assert_eq!(search_name("marks@x.io").as_deref(), Some("Marks"));
    }

    #[test]
    fn search_name_rejects_non_names() {
        assert_eq!(search_name("j.smith@x.io"), None);
        assert_eq!(search_name("bob@x.io"), None);
        assert_eq!(search_name("dev42@x.io"), None);
        assert_eq!(search_name(""), None);
    }

    #[test]
    fn greeting_needs_two_words() {
        assert_eq!(greeting_name("John Smith").as_deref(), Some("John"));
        assert_eq!(greeting_name("Jucano"), None);
        assert_eq!(greeting_name("M Chen"), None);
        assert_eq!(greeting_name(""), None);
    }
}
