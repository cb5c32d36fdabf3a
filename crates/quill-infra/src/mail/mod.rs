//! Outbound mail delivery.

mod log;
mod mailgun;

pub use self::log::LogMailer;
pub use mailgun::{MailgunConfig, MailgunMailer};
