//! Cron-style job scheduler using tokio-cron-scheduler.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use quill_core::UserService;
use quill_infra::InMemoryRateLimiter;

/// Once a minute.
const RATE_LIMIT_PRUNE_CRON: &str = "0 * * * * *";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable scheduler.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler.
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Add a cron job.
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Clear recovery tokens past their expiry, including those whose
    /// expiry task was lost with a restart.
    pub async fn add_recovery_sweep(
        &self,
        schedule: &str,
        users: UserService,
    ) -> Result<uuid::Uuid, JobSchedulerError> {
        self.add_cron(schedule, move || {
            let users = users.clone();
            async move {
                match users.sweep_expired_recoveries(Utc::now()).await {
                    Ok(0) => {}
                    Ok(cleared) => tracing::info!(cleared, "Expired recovery tokens cleared"),
                    Err(e) => tracing::error!(error = %e, "Recovery sweep failed"),
                }
            }
        })
        .await
    }

    /// Drop rate limiter buckets that have refilled.
    pub async fn add_rate_limit_prune(
        &self,
        limiter: Arc<InMemoryRateLimiter>,
    ) -> Result<uuid::Uuid, JobSchedulerError> {
        self.add_cron(RATE_LIMIT_PRUNE_CRON, move || {
            let limiter = limiter.clone();
            async move {
                limiter.prune();
                tracing::debug!(keys = limiter.tracked_keys(), "Rate limiter pruned");
            }
        })
        .await
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_schedule_is_rejected() {
        let scheduler = Scheduler::new(SchedulerConfig::default()).await.unwrap();
        let result = scheduler.add_cron("not a cron line", || async {}).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_disabled_scheduler_does_not_start() {
        let scheduler = Scheduler::new(SchedulerConfig { enabled: false }).await.unwrap();
        assert!(scheduler.start().await.is_ok());
    }
}
