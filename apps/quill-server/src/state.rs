//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::error::RepoError;
use quill_core::ports::{
    JobQueue, JobQueueError, Mailer, PasswordService, PostRepository, SessionProvider,
    SettingsStore, UserRepository,
};
use quill_core::{PostService, SearchEngine, SettingsService, UserService};
use quill_infra::{
    Argon2PasswordService, InMemoryJobQueue, InMemoryPostRepository, InMemoryRateLimiter,
    InMemorySettingsStore, InMemoryUserRepository, JsonFileSettingsStore, JwtSessionProvider,
    JwtTokenService, LogMailer, MailgunMailer, MarkdownRenderer,
};

use crate::background;
use crate::config::{AppConfig, MailTransport};

/// Failures that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("settings store: {0}")]
    Settings(#[from] RepoError),

    #[error("database: {0}")]
    Database(String),
}

/// The persistence backends behind the services.
pub struct Stores {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    /// Everything in process memory; lost on restart.
    pub fn in_memory() -> Self {
        Self {
            posts: Arc::new(InMemoryPostRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            settings: Arc::new(InMemorySettingsStore::default()),
        }
    }

    /// PostgreSQL when `DATABASE_URL` is set and reachable, otherwise memory.
    /// Settings live in the configured JSON file.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let mut stores = Self::in_memory();

        if let Some(path) = &config.settings_path {
            let store = JsonFileSettingsStore::open(path).await?;
            tracing::info!(path = %store.path().display(), "Using settings file");
            stores.settings = Arc::new(store);
        }

        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            use migration::MigratorTrait;
            use quill_infra::{PostgresPostRepository, PostgresUserRepository};

            match quill_infra::database::connect(db_config).await {
                Ok(conn) => {
                    migration::Migrator::up(&conn, None)
                        .await
                        .map_err(|e| StartupError::Database(e.to_string()))?;
                    let conn = Arc::new(conn);
                    stores.posts = Arc::new(PostgresPostRepository::shared(conn.clone()));
                    stores.users = Arc::new(PostgresUserRepository::shared(conn));
                    return Ok(stores);
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        }

        #[cfg(not(feature = "postgres"))]
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without the postgres feature.");
        }

        if config.database.is_none() {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
        Ok(stores)
    }

    /// Fill in the blog name and hostname of a not yet installed blog.
    pub async fn seed_settings(&self, config: &AppConfig) -> Result<(), RepoError> {
        let mut settings = self.settings.load().await?;
        if !settings.first_run {
            return Ok(());
        }

        let mut changed = false;
        if let Some(name) = config.blog_name.as_ref().filter(|_| settings.name.is_empty()) {
            settings.name = name.clone();
            changed = true;
        }
        if let Some(host) = config
            .blog_hostname
            .as_ref()
            .filter(|_| settings.hostname.is_empty())
        {
            settings.hostname = host.clone();
            changed = true;
        }

        if changed {
            self.settings.save(settings).await?;
        }
        Ok(())
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub users: UserService,
    pub settings: SettingsService,
    pub sessions: Arc<dyn SessionProvider>,
    pub rate_limiter: Arc<InMemoryRateLimiter>,
    pub jobs: Arc<dyn JobQueue>,
}

impl AppState {
    /// Build the production state: configured stores, Argon2 and the
    /// configured mail transport.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let stores = Stores::from_config(config).await?;
        stores.seed_settings(config).await?;

        let mailer: Arc<dyn Mailer> = match &config.mail {
            MailTransport::Mailgun(mailgun) => Arc::new(MailgunMailer::new(mailgun.clone())),
            MailTransport::Log => {
                tracing::warn!("Mail transport is 'log': recovery mail will not be delivered");
                Arc::new(LogMailer)
            }
        };

        let state = Self::assemble(config, stores, Arc::new(Argon2PasswordService::new()), mailer);
        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// Wire services over the given stores. Background workers are not
    /// started; see [`AppState::start_background_jobs`].
    pub fn assemble(
        config: &AppConfig,
        stores: Stores,
        passwords: Arc<dyn PasswordService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let jobs: Arc<dyn JobQueue> = Arc::new(InMemoryJobQueue::new(config.jobs.clone()));
        let tokens = Arc::new(JwtTokenService::new(config.jwt.clone()));

        let posts = PostService::new(
            stores.posts.clone(),
            stores.users.clone(),
            Arc::new(MarkdownRenderer::new()),
            jobs.clone(),
        )
        .with_search_engine(SearchEngine::new().with_matching(config.search_matching));

        let users = UserService::new(stores.users, stores.posts, passwords, mailer, jobs.clone());

        Self {
            posts,
            users,
            settings: SettingsService::new(stores.settings),
            sessions: Arc::new(JwtSessionProvider::new(tokens)),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone())),
            jobs,
        }
    }

    /// Start the workers that run view counts and recovery expiry.
    pub async fn start_background_jobs(&self) -> Result<(), JobQueueError> {
        let handler = background::task_handler(self.posts.clone(), self.users.clone());
        self.jobs.start_worker(handler).await
    }
}
