//! Domain entities - the core business objects.

mod post;
mod settings;
pub mod text;
mod user;

pub use post::{Post, PostContent, PostId};
pub use settings::{BlogSettings, MailerSettings};
pub use user::{RecoveryToken, User, UserId};
