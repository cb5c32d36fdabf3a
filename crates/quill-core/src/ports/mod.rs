//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod job_queue;
mod mailer;
mod rate_limit;
mod renderer;
mod repository;
mod settings;

pub use auth::{AuthError, IssuedSession, PasswordService, Session, SessionProvider, TokenClaims, TokenService};
pub use job_queue::{
    BackgroundTask, Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats, job_handler,
};
pub use mailer::{MailError, Mailer, OutgoingMail};
pub use rate_limit::{RateDecision, RateLimitError, RateLimiter};
pub use renderer::ContentRenderer;
pub use repository::{BaseRepository, PostRepository, UserRepository};
pub use settings::SettingsStore;
