use async_trait::async_trait;

use crate::domain::BlogSettings;
use crate::error::RepoError;

/// Persistence for the site-wide settings document.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<BlogSettings, RepoError>;

    async fn save(&self, settings: BlogSettings) -> Result<(), RepoError>;

    /// Save only while the stored document is still in first-run state,
    /// checked and written as one step. `false` when the blog was installed
    /// in the meantime and nothing was written.
    async fn save_if_first_run(&self, settings: BlogSettings) -> Result<bool, RepoError>;
}
