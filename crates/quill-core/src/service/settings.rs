use std::sync::Arc;

use crate::domain::{BlogSettings, MailerSettings, UserId};
use crate::error::DomainError;
use crate::ports::SettingsStore;

/// Editable blog settings. `first_run` is managed by the service.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub name: String,
    pub hostname: String,
    pub description: String,
    pub allow_registrations: bool,
    pub markdown: bool,
    pub mailer: MailerSettings,
    pub disqus: Option<String>,
    pub google_analytics: Option<String>,
}

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Full settings, secrets included. Never hand this to clients.
    pub async fn load(&self) -> Result<BlogSettings, DomainError> {
        Ok(self.store.load().await?)
    }

    /// Settings with the mail private key removed.
    pub async fn read(&self) -> Result<BlogSettings, DomainError> {
        Ok(self.load().await?.redacted())
    }

    /// Apply an update. On first run anyone may install the blog, which also
    /// opens registrations; afterwards an authenticated actor is required.
    pub async fn apply(
        &self,
        update: SettingsUpdate,
        actor: Option<UserId>,
    ) -> Result<BlogSettings, DomainError> {
        let current = self.load().await?;
        let next = merge(&current, update);

        match actor {
            Some(_) => self.store.save(next.clone()).await?,
            None if current.first_run => {
                if !self.store.save_if_first_run(next.clone()).await? {
                    return Err(DomainError::Unauthorized);
                }
            }
            None => return Err(DomainError::Unauthorized),
        }
        Ok(next.redacted())
    }

    /// First-run installation; refused once the blog is set up, including by
    /// a concurrent install that saved first.
    pub async fn install(&self, update: SettingsUpdate) -> Result<BlogSettings, DomainError> {
        let current = self.load().await?;
        if !current.first_run {
            return Err(already_installed());
        }

        let next = merge(&current, update);
        if !self.store.save_if_first_run(next.clone()).await? {
            return Err(already_installed());
        }
        Ok(next.redacted())
    }
}

fn already_installed() -> DomainError {
    DomainError::Forbidden("blog is already installed".to_string())
}

/// The document an update produces. Installing opens registrations and an
/// empty private key keeps the stored one.
fn merge(current: &BlogSettings, update: SettingsUpdate) -> BlogSettings {
    let mut mailer = update.mailer;
    if mailer.private_key.is_empty() {
        mailer.private_key = current.mailer.private_key.clone();
    }

    BlogSettings {
        name: update.name,
        hostname: update.hostname,
        description: update.description,
        allow_registrations: current.first_run || update.allow_registrations,
        markdown: update.markdown,
        first_run: false,
        mailer,
        disqus: update.disqus.filter(|s| !s.is_empty()),
        google_analytics: update.google_analytics.filter(|s| !s.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySettings;

    fn update(name: &str, key: &str) -> SettingsUpdate {
        SettingsUpdate {
            name: name.to_string(),
            hostname: "https://blog.example.com".to_string(),
            mailer: MailerSettings {
                domain: "mg.example.com".to_string(),
                private_key: key.to_string(),
            },
            ..SettingsUpdate::default()
        }
    }

    #[tokio::test]
    async fn test_install_once() {
        let store = Arc::new(MemorySettings::with(BlogSettings::first_run()));
        let service = SettingsService::new(store.clone());

        let installed = service.install(update("Quill", "key-1")).await.unwrap();
        assert!(!installed.first_run);
        assert!(installed.allow_registrations);
        assert!(installed.mailer.private_key.is_empty());
        assert_eq!(store.current().mailer.private_key, "key-1");

        assert!(matches!(
            service.install(update("Again", "key-2")).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_installs_admit_one() {
        let store = Arc::new(MemorySettings::with(BlogSettings::first_run()));
        let service = SettingsService::new(store.clone());

        let (first, second) = tokio::join!(
            service.install(update("First", "key-1")),
            service.install(update("Second", "key-2")),
        );

        let outcomes = [first.is_ok(), second.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let winner = if first.is_ok() { "First" } else { "Second" };
        assert_eq!(store.current().name, winner);

        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(loser, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_apply_requires_actor_after_install() {
        let store = Arc::new(MemorySettings::with(BlogSettings::default()));
        let service = SettingsService::new(store.clone());

        assert!(matches!(
            service.apply(update("Anon", ""), None).await,
            Err(DomainError::Unauthorized)
        ));
        assert!(service.apply(update("Owner", ""), Some(1)).await.is_ok());
        assert_eq!(store.current().name, "Owner");
    }

    #[tokio::test]
    async fn test_empty_private_key_keeps_stored_one() {
        let store = Arc::new(MemorySettings::with(BlogSettings::first_run()));
        let service = SettingsService::new(store.clone());
        service.install(update("Quill", "key-1")).await.unwrap();

        service.apply(update("Quill", ""), Some(1)).await.unwrap();
        assert_eq!(store.current().mailer.private_key, "key-1");

        service.apply(update("Quill", "key-2"), Some(1)).await.unwrap();
        assert_eq!(store.current().mailer.private_key, "key-2");
        assert!(service.read().await.unwrap().mailer.private_key.is_empty());
    }
}
