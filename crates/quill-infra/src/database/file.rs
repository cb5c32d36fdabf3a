//! Settings persisted as a JSON document on local disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::domain::BlogSettings;
use quill_core::error::RepoError;
use quill_core::ports::SettingsStore;

/// Keeps the settings document in memory and writes every save through to
/// `path`. A missing or empty file means the blog has not been installed yet.
pub struct JsonFileSettingsStore {
    path: PathBuf,
    settings: RwLock<BlogSettings>,
}

impl JsonFileSettingsStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let path = path.into();
        let settings = match tokio::fs::read(&path).await {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => BlogSettings::first_run(),
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                RepoError::Query(format!("invalid settings file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No settings file, starting in first-run mode");
                BlogSettings::first_run()
            }
            Err(e) => return Err(RepoError::Connection(e.to_string())),
        };

        Ok(Self {
            path,
            settings: RwLock::new(settings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, settings: &BlogSettings) -> Result<(), RepoError> {
        let data =
            serde_json::to_vec_pretty(settings).map_err(|e| RepoError::Query(e.to_string()))?;

        // write beside the target and rename so readers never see half a file
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, &data)
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| RepoError::Connection(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn load(&self) -> Result<BlogSettings, RepoError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: BlogSettings) -> Result<(), RepoError> {
        let mut current = self.settings.write().await;
        self.persist(&settings).await?;
        *current = settings;
        Ok(())
    }

    async fn save_if_first_run(&self, settings: BlogSettings) -> Result<bool, RepoError> {
        let mut current = self.settings.write().await;
        if !current.first_run {
            return Ok(false);
        }
        self.persist(&settings).await?;
        *current = settings;
        Ok(true)
    }
}
