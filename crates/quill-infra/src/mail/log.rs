use async_trait::async_trait;

use quill_core::domain::MailerSettings;
use quill_core::ports::{MailError, Mailer, OutgoingMail};

/// Writes messages to the log instead of sending them. Used in development
/// and whenever no mail provider is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, _credentials: &MailerSettings, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.body,
            "Mail not delivered (log mailer)"
        );
        Ok(())
    }
}
