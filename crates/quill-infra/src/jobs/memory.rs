//! In-memory job queue implementation.
//!
//! Jobs are held in a bounded channel and processed by local workers.
//! Delayed jobs wait in a timer task until they are due. Jobs are lost on
//! server restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, mpsc};

use quill_core::ports::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats};

/// In-memory job queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum number of pending jobs (0 = unlimited).
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
    /// Base delay between retries; multiplied by the attempt number.
    pub retry_backoff: Duration,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10000,
            workers: 4,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

impl InMemoryJobQueueConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: std::env::var("JOB_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            workers: std::env::var("JOB_QUEUE_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.workers),
            ..defaults
        }
    }
}

#[derive(Default)]
struct JobStats {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// In-memory job queue.
pub struct InMemoryJobQueue {
    stats: Arc<JobStats>,
    config: InMemoryJobQueueConfig,
    job_sender: mpsc::Sender<Job>,
    job_receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(100));

        Self {
            stats: Arc::new(JobStats::default()),
            config,
            job_sender: tx,
            job_receiver: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(InMemoryJobQueueConfig::from_env())
    }
}

/// Hand a job to the workers, after its delay if it has one.
fn dispatch(sender: mpsc::Sender<Job>, job: Job, delay: Option<Duration>) {
    tokio::spawn(async move {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = sender.send(job).await {
            tracing::error!("Failed to dispatch job: {}", e);
        }
    });
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if self.config.max_size > 0 {
            let current_size = self.stats.pending.load(Ordering::Relaxed);
            if current_size >= self.config.max_size {
                tracing::warn!(task = job.task.name(), "Job queue full, job dropped");
                return Err(JobQueueError::QueueFull);
            }
        }

        self.stats.pending.fetch_add(1, Ordering::Relaxed);

        match job.remaining_delay(Utc::now()) {
            Some(delay) => {
                tracing::debug!(job_id = %job.id, task = job.task.name(), ?delay, "Job scheduled");
                dispatch(self.job_sender.clone(), job, Some(delay));
            }
            None => {
                let task = job.task.name();
                if let Err(e) = self.job_sender.send(job).await {
                    self.stats.pending.fetch_sub(1, Ordering::Relaxed);
                    tracing::error!(task, error = %e, "Job queue closed, job dropped");
                    return Err(JobQueueError::EnqueueError(e.to_string()));
                }
                tracing::debug!(
                    task,
                    "Job enqueued. Queue size: {}",
                    self.stats.pending.load(Ordering::Relaxed)
                );
            }
        }

        Ok(())
    }

    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError> {
        let handler = Arc::new(handler);

        for worker_id in 0..self.config.workers.max(1) {
            let handler = handler.clone();
            let receiver = self.job_receiver.clone();
            let stats = self.stats.clone();
            let sender = self.job_sender.clone();
            let backoff = self.config.retry_backoff;

            tokio::spawn(async move {
                tracing::info!("Job worker {} started", worker_id);

                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(mut job) = job else {
                        tracing::info!("Job worker {} shutting down", worker_id);
                        break;
                    };

                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                    stats.processing.fetch_add(1, Ordering::Relaxed);

                    tracing::debug!(
                        worker = worker_id,
                        job_id = %job.id,
                        task = job.task.name(),
                        "Processing job"
                    );

                    job.attempts += 1;
                    let result = handler(job.clone()).await;

                    stats.processing.fetch_sub(1, Ordering::Relaxed);

                    match result {
                        JobResult::Success => {
                            stats.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(job_id = %job.id, "Job completed successfully");
                        }
                        JobResult::Retry(reason) if job.attempts < job.max_attempts => {
                            tracing::warn!(
                                job_id = %job.id,
                                attempt = job.attempts,
                                max_attempts = job.max_attempts,
                                reason = %reason,
                                "Job failed, will retry"
                            );
                            stats.pending.fetch_add(1, Ordering::Relaxed);
                            let delay = backoff * job.attempts;
                            dispatch(sender.clone(), job, Some(delay));
                        }
                        JobResult::Retry(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                job_id = %job.id,
                                reason = %reason,
                                "Job failed after max retries"
                            );
                        }
                        JobResult::Failed(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(job_id = %job.id, reason = %reason, "Job failed permanently");
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.stats.pending.load(Ordering::Relaxed),
            processing: self.stats.processing.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;
    use quill_core::ports::{BackgroundTask, job_handler};

    fn queue(max_size: usize) -> InMemoryJobQueue {
        InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size,
            workers: 2,
            retry_backoff: Duration::from_millis(1),
        })
    }

    fn views(post_id: i64) -> Job {
        Job::new(BackgroundTask::IncrementViews { post_id })
    }

    async fn wait_for(queue: &InMemoryJobQueue, done: impl Fn(&QueueStats) -> bool) -> QueueStats {
        for _ in 0..200 {
            let stats = queue.stats().await.unwrap();
            if done(&stats) {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        queue.stats().await.unwrap()
    }

    #[tokio::test]
    async fn test_jobs_complete() {
        let queue = queue(100);
        queue
            .start_worker(job_handler(|_job| async { JobResult::Success }))
            .await
            .unwrap();

        for id in 0..5 {
            queue.enqueue(views(id)).await.unwrap();
        }

        let stats = wait_for(&queue, |s| s.completed == 5).await;
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_retry_until_max_attempts() {
        let queue = queue(100);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        queue
            .start_worker(job_handler(move |_job| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { JobResult::Retry("flaky".to_string()) }
            }))
            .await
            .unwrap();

        queue.enqueue(views(1).with_max_attempts(3)).await.unwrap();

        let stats = wait_for(&queue, |s| s.failed == 1).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let queue = queue(100);
        queue
            .start_worker(job_handler(|_job| async {
                JobResult::Failed("bad".to_string())
            }))
            .await
            .unwrap();

        queue.enqueue(views(1)).await.unwrap();

        let stats = wait_for(&queue, |s| s.failed == 1).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 0);
    }

    #[tokio::test]
    async fn test_delayed_job_waits() {
        let queue = queue(100);
        queue
            .start_worker(job_handler(|_job| async { JobResult::Success }))
            .await
            .unwrap();

        queue
            .enqueue(views(1).delayed(chrono::Duration::milliseconds(150)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let early = queue.stats().await.unwrap();
        assert_eq!(early.pending, 1);
        assert_eq!(early.completed, 0);

        let stats = wait_for(&queue, |s| s.completed == 1).await;
        assert_eq!(stats.completed, 1);
    }

    #[tokio::test]
    async fn test_queue_full() {
        let queue = queue(2);
        queue.enqueue(views(1)).await.unwrap();
        queue.enqueue(views(2)).await.unwrap();

        assert!(matches!(
            queue.enqueue(views(3)).await,
            Err(JobQueueError::QueueFull)
        ));
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_and_releases_slot() {
        let queue = queue(100);
        queue.job_receiver.lock().await.close();

        assert!(matches!(
            queue.enqueue(views(1)).await,
            Err(JobQueueError::EnqueueError(_))
        ));
        assert_eq!(queue.stats().await.unwrap().pending, 0);
    }
}
