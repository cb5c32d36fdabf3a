//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! storage, sessions, password hashing, rate limiting, background jobs,
//! mail delivery and Markdown rendering.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repositories via SeaORM
//! - `minimal` - In-memory repositories only

pub mod auth;
pub mod database;
pub mod jobs;
pub mod mail;
pub mod rate_limit;
pub mod render;

pub use auth::{Argon2PasswordService, JwtConfig, JwtSessionProvider, JwtTokenService};
pub use database::{
    DatabaseConfig, InMemoryPostRepository, InMemorySettingsStore, InMemoryUserRepository,
    JsonFileSettingsStore,
};
pub use jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};
pub use mail::{LogMailer, MailgunConfig, MailgunMailer};
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
pub use render::MarkdownRenderer;

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository};
