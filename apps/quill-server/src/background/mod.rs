//! Background work: queued tasks and periodic maintenance.

#[cfg(feature = "scheduler")]
pub mod scheduler;
mod tasks;

pub use tasks::task_handler;
