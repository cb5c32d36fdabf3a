//! Persistence: SeaORM repositories for PostgreSQL and in-memory fallbacks.

mod connections;
mod file;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
pub use file::JsonFileSettingsStore;
pub use memory::{InMemoryPostRepository, InMemorySettingsStore, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresPostRepository, PostgresUserRepository};
