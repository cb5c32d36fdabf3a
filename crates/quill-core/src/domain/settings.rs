use serde::{Deserialize, Serialize};

use super::{PostId, UserId};
use crate::search::ContentSource;

/// Site-wide blog settings.
///
/// Handed to services explicitly on every call; nothing in the core reads
/// settings from process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogSettings {
    pub name: String,
    pub hostname: String,
    pub description: String,
    pub allow_registrations: bool,
    /// Raw Markdown is the canonical authoring form.
    pub markdown: bool,
    pub first_run: bool,
    pub mailer: MailerSettings,
    pub disqus: Option<String>,
    pub google_analytics: Option<String>,
}

/// Credentials for the outbound mail provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailerSettings {
    pub domain: String,
    pub private_key: String,
}

impl BlogSettings {
    /// Settings of a fresh installation that has not run the install step yet.
    pub fn first_run() -> Self {
        Self {
            first_run: true,
            ..Self::default()
        }
    }

    /// Which post field search treats as canonical content.
    pub fn content_source(&self) -> ContentSource {
        if self.markdown {
            ContentSource::Markdown
        } else {
            ContentSource::Rendered
        }
    }

    /// Copy safe to hand to clients.
    pub fn redacted(&self) -> Self {
        let mut safe = self.clone();
        safe.mailer.private_key.clear();
        safe
    }

    pub fn post_url(&self, slug: &str) -> String {
        format!("{}/post/{}", self.base_url(), slug)
    }

    pub fn reset_url(&self, user_id: UserId, token: &str) -> String {
        format!("{}/user/reset/{}/{}", self.base_url(), user_id, token)
    }

    pub fn feed_item_id(&self, id: PostId) -> String {
        format!("{}/post/{}", self.base_url(), id)
    }

    fn base_url(&self) -> &str {
        self.hostname.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_drops_private_key() {
        let settings = BlogSettings {
            mailer: MailerSettings {
                domain: "mg.example.com".to_string(),
                private_key: "key-secret".to_string(),
            },
            ..BlogSettings::default()
        };

        let safe = settings.redacted();
        assert_eq!(safe.mailer.domain, "mg.example.com");
        assert!(safe.mailer.private_key.is_empty());
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let settings = BlogSettings {
            hostname: "https://blog.example.com/".to_string(),
            ..BlogSettings::default()
        };

        assert_eq!(
            settings.post_url("hello-world"),
            "https://blog.example.com/post/hello-world"
        );
        assert_eq!(
            settings.reset_url(4, "abc"),
            "https://blog.example.com/user/reset/4/abc"
        );
    }

    #[test]
    fn test_content_source_follows_markdown_switch() {
        let mut settings = BlogSettings::default();
        assert_eq!(settings.content_source(), ContentSource::Rendered);
        settings.markdown = true;
        assert_eq!(settings.content_source(), ContentSource::Markdown);
    }
}
