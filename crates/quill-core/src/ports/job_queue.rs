//! Job queue port - background side effects with an owning worker pool.
//!
//! View counting and recovery-token expiry run here instead of as detached
//! tasks, so every run is accounted for in [`QueueStats`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::domain::{PostId, UserId};

/// Work a job performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundTask {
    /// Count one read of a post.
    IncrementViews { post_id: PostId },
    /// Clear a recovery token if it is still the one that was issued.
    ExpireRecovery { user_id: UserId, token: String },
}

impl BackgroundTask {
    pub fn name(&self) -> &'static str {
        match self {
            BackgroundTask::IncrementViews { .. } => "increment_views",
            BackgroundTask::ExpireRecovery { .. } => "expire_recovery",
        }
    }
}

/// A job that can be queued and processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    pub task: BackgroundTask,
    /// Number of attempts made so far.
    pub attempts: u32,
    /// Maximum attempts before the job is marked failed.
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    /// Earliest execution time for delayed jobs.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(task: BackgroundTask) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task,
            attempts: 0,
            max_attempts: 3,
            created_at: Utc::now(),
            scheduled_at: None,
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.scheduled_at = Some(Utc::now() + delay);
        self
    }

    /// Time left before the job is due, if it is delayed into the future.
    pub fn remaining_delay(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        self.scheduled_at
            .filter(|at| *at > now)
            .and_then(|at| (at - now).to_std().ok())
    }
}

/// Result of job processing.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed successfully.
    Success,
    /// Job failed, should be retried.
    Retry(String),
    /// Job failed permanently, should not be retried.
    Failed(String),
}

/// Job handler function type.
pub type JobHandler =
    Box<dyn Fn(Job) -> Pin<Box<dyn Future<Output = JobResult> + Send>> + Send + Sync>;

/// Box an async function as a [`JobHandler`].
pub fn job_handler<F, Fut>(f: F) -> JobHandler
where
    F: Fn(Job) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JobResult> + Send + 'static,
{
    Box::new(move |job| -> Pin<Box<dyn Future<Output = JobResult> + Send>> { Box::pin(f(job)) })
}

/// Job queue trait - abstraction over job queue backends.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for processing.
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Start processing jobs with the given handler.
    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError>;

    /// Get queue statistics.
    async fn stats(&self) -> Result<QueueStats, JobQueueError>;
}

/// Queue statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Job queue errors.
#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("Failed to enqueue job: {0}")]
    EnqueueError(String),

    #[error("Queue is full")]
    QueueFull,

    #[error("Backend error: {0}")]
    Backend(String),
}
