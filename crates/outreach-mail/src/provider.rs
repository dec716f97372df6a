use std::fmt;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the connection to the SMTP server is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// TLS from the first byte (port 465).
    ImplicitTls,
    /// Plain connection upgraded with STARTTLS (port 587).
    StartTls,
}

/// Login for a mail account. Only exists when both halves are present.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub password: String,
}

impl Account {
    /// `None` unless both values are present and non-blank.
    pub fn from_parts(email: Option<String>, password: Option<String>) -> Option<Self> {
        let email = email.filter(|e| !e.trim().is_empty())?;
        let password = password.filter(|p| !p.trim().is_empty())?;
        Some(Self {
            email: email.trim().to_string(),
            password,
        })
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct SmtpProvider {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub security: Security,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl SmtpProvider {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        security: Security,
        account: &Account,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            security,
            username: account.email.clone(),
            password: account.password.clone(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn gmail_tls(account: &Account) -> Self {
        Self::new("Gmail", "smtp.gmail.com", 465, Security::ImplicitTls, account)
    }

    pub fn gmail_starttls(account: &Account) -> Self {
        Self::new("Gmail_TLS", "smtp.gmail.com", 587, Security::StartTls, account)
    }

    pub fn outlook(account: &Account) -> Self {
        Self::new(
            "Outlook",
            "smtp-mail.outlook.com",
            587,
            Security::StartTls,
            account,
        )
    }
}

impl fmt::Debug for SmtpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpProvider")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// The provider chain in priority order: Gmail over implicit TLS, Gmail over
/// STARTTLS, then Outlook. Accounts that are not configured contribute nothing.
pub fn standard_providers(gmail: Option<Account>, outlook: Option<Account>) -> Vec<SmtpProvider> {
    let mut providers = Vec::new();
    if let Some(account) = gmail {
        providers.push(SmtpProvider::gmail_tls(&account));
        providers.push(SmtpProvider::gmail_starttls(&account));
    }
    if let Some(account) = outlook {
        providers.push(SmtpProvider::outlook(&account));
    }
    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(email: &str) -> Account {
        Account::from_parts(Some(email.into()), Some("secret".into())).unwrap()
    }

    #[test]
    fn account_requires_both_parts() {
        assert!(Account::from_parts(Some("a@b.io".into()), None).is_none());
        assert!(Account::from_parts(None, Some("pw".into())).is_none());
        assert!(Account::from_parts(Some("  ".into()), Some("pw".into())).is_none());
        assert!(Account::from_parts(Some("a@b.io".into()), Some("".into())).is_none());
    }

    #[test]
    fn debug_hides_password() {
        let a = account("me@gmail.com");
        let provider = SmtpProvider::gmail_tls(&a);
        assert!(!format!("{a:?}").contains("secret"));
        assert!(!format!("{provider:?}").contains("secret"));
    }

    #[test]
    fn standard_chain_order() {
        let providers = standard_providers(Some(account("me@gmail.com")), Some(account("me@outlook.com")));
        let summary: Vec<(&str, u16, Security)> = providers
            .iter()
            .map(|p| (p.name.as_str(), p.port, p.security))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Gmail", 465, Security::ImplicitTls),
                ("Gmail_TLS", 587, Security::StartTls),
                ("Outlook", 587, Security::StartTls),
            ]
        );
        assert_eq!(providers[2].username, "me@outlook.com");
        assert_eq!(providers[0].timeout, Duration::from_secs(10));
    }

    #[test]
    fn missing_accounts_contribute_nothing() {
        assert!(standard_providers(None, None).is_empty());
        let only_outlook = standard_providers(None, Some(account("me@outlook.com")));
        assert_eq!(only_outlook.len(), 1);
        assert_eq!(only_outlook[0].host, "smtp-mail.outlook.com");
    }
}
