use crate::title_case;

/// Normalize user input into a bare domain.
///
/// Strips scheme, `www.` and any path. Returns `None` when what remains
/// cannot be a domain (no dot).
pub fn clean_domain(input: &str) -> Option<String> {
    let mut domain = input.trim().to_lowercase();
    for prefix in ["https://", "http://", "www."] {
        domain = domain.replace(prefix, "");
    }
    let domain = domain.split('/').next().unwrap_or_default().to_string();

    if !domain.contains('.') {
        return None;
    }
    Some(domain)
}

/// Human-facing company name derived from a cleaned domain.
pub fn company_name(domain: &str) -> String {
    let label = domain.split('.').next().unwrap_or(domain);
    title_case(label)
}
