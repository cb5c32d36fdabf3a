//! Application services.
//!
//! Each call fetches fresh state from the stores and re-checks authorization;
//! nothing is cached between calls.

pub mod posts;
pub mod settings;
pub mod users;

pub use posts::{FeedEntry, PostDraft, PostService};
pub use settings::{SettingsService, SettingsUpdate};
pub use users::{Profile, Registration, UserService};
