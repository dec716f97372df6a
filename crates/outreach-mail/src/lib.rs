//! # outreach-mail
//!
//! Sends outreach email through an ordered list of SMTP providers, falling
//! back to the next provider when one fails.
//!
//! ```rust,no_run
//! use outreach_mail::{Account, Mailer, OutgoingEmail};
//!
//! # async fn demo() -> outreach_mail::Result<()> {
//! let gmail = Account::from_parts(Some("me@gmail.com".into()), Some("app-password".into()));
//! let mailer = Mailer::new(outreach_mail::standard_providers(gmail, None));
//!
//! let delivery = mailer
//!     .send(&OutgoingEmail::new("jane@acme.io", "Hello", "Hi Jane,\n\nQuick note."))
//!     .await?;
//! println!("sent via {}", delivery.provider);
//! # Ok(())
//! # }
//! ```

mod mailer;
mod message;
mod provider;
mod transport;

pub use mailer::{BulkReport, ConnectionCheck, Delivery, Mailer};
pub use message::{build_message, html_body, OutgoingEmail};
pub use provider::{standard_providers, Account, Security, SmtpProvider};
pub use transport::{FailureKind, SendFailure, SmtpTransport, Transport};

/// The built message handed to a [`Transport`].
pub use lettre::Message;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Message error: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("No email providers configured")]
    NoProviders,
    #[error("All email providers failed for {to} ({attempts} attempts)")]
    AllProvidersFailed { to: String, attempts: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
