use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

fn exact_email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("exact email pattern is valid")
    })
}

/// Pull every email-shaped substring out of arbitrary text or HTML.
///
/// Results are lowercased and de-duplicated, keeping first-seen order.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    email_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

/// Whether the whole (trimmed) string is a single email address.
pub fn is_email(text: &str) -> bool {
    exact_email_regex().is_match(text.trim())
}

/// The part before `@`, or the whole string when there is none.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_html() {
        let html = r#"<span class="text-heading">John.Smith@Acme.io</span>
            <td>jane@acme.io</td><a href="mailto:john.smith@acme.io">mail</a>"#;
        let emails = extract_emails(html);
        assert_eq!(emails, vec!["john.smith@acme.io", "jane@acme.io"]);
    }

    #[test]
    fn ignores_text_without_tld() {
        assert!(extract_emails("user@localhost and @handle").is_empty());
    }

    #[test]
    fn exact_match_rejects_surrounding_text() {
        assert!(is_email("a.b@example.com"));
        assert!(is_email("  a.b@example.com "));
        assert!(!is_email("contact a.b@example.com"));
        assert!(!is_email("a.b@example"));
    }

    #[test]
    fn local_part_without_at() {
        assert_eq!(local_part("john@x.io"), "john");
        assert_eq!(local_part("nobody"), "nobody");
    }
}
