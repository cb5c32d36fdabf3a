//! Outbound mail port.

use async_trait::async_trait;

use crate::domain::MailerSettings;

/// A single plain-text message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message using the credentials from the blog settings.
    async fn send(&self, credentials: &MailerSettings, mail: OutgoingMail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mailer is not configured")]
    NotConfigured,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}
