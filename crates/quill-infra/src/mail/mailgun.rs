//! Mailgun HTTP API delivery.

use std::time::Duration;

use async_trait::async_trait;

use quill_core::domain::MailerSettings;
use quill_core::ports::{MailError, Mailer, OutgoingMail};

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// API root, e.g. `https://api.mailgun.net/v3`.
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for MailgunConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.mailgun.net/v3".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl MailgunConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("MAILGUN_API_BASE").unwrap_or(defaults.api_base),
            ..defaults
        }
    }
}

/// Sends mail through Mailgun using the domain and key from the blog settings.
pub struct MailgunMailer {
    client: reqwest::Client,
    config: MailgunConfig,
}

impl MailgunMailer {
    pub fn new(config: MailgunConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn messages_url(&self, domain: &str) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            domain
        )
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, credentials: &MailerSettings, mail: OutgoingMail) -> Result<(), MailError> {
        if credentials.domain.is_empty() || credentials.private_key.is_empty() {
            return Err(MailError::NotConfigured);
        }

        let form = [
            ("from", mail.from.as_str()),
            ("to", mail.to.as_str()),
            ("subject", mail.subject.as_str()),
            ("text", mail.body.as_str()),
        ];

        let response = self
            .client
            .post(self.messages_url(&credentials.domain))
            .basic_auth("api", Some(&credentials.private_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Mailgun rejected message");
            return Err(MailError::Delivery(format!("{}: {}", status, body)));
        }

        tracing::info!(domain = %credentials.domain, "Mail sent");
        Ok(())
    }
}
