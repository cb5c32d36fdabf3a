//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! This crate contains the search engine, the post authorization rules and the
//! services built on them. It has zero infrastructure dependencies and never logs:
//! every failure is returned as a typed error for the caller to present.

pub mod authz;
pub mod domain;
pub mod error;
pub mod ports;
pub mod search;
pub mod service;

#[cfg(test)]
mod testing;

pub use authz::{PostAction, PostAuthorizationGuard};
pub use error::{DomainError, RepoError};
pub use search::{ContentSource, QueryMatching, SearchEngine, SearchQuery};
pub use service::{PostService, SettingsService, UserService};
