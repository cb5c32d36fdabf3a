//! Runs queued [`BackgroundTask`]s against the services.

use quill_core::error::{DomainError, RepoError};
use quill_core::ports::{BackgroundTask, Job, JobHandler, JobResult, job_handler};
use quill_core::{PostService, UserService};

/// Handler for the job queue workers.
pub fn task_handler(posts: PostService, users: UserService) -> JobHandler {
    job_handler(move |job: Job| {
        let posts = posts.clone();
        let users = users.clone();
        async move { run(&posts, &users, job).await }
    })
}

async fn run(posts: &PostService, users: &UserService, job: Job) -> JobResult {
    let outcome = match &job.task {
        BackgroundTask::IncrementViews { post_id } => posts.record_view(*post_id).await,
        BackgroundTask::ExpireRecovery { user_id, token } => {
            users.expire_recovery(*user_id, token).await.map(|cleared| {
                if cleared {
                    tracing::debug!(user_id, "Recovery token expired");
                }
            })
        }
    };

    match outcome {
        Ok(()) => JobResult::Success,
        Err(err) => classify(job.task.name(), err),
    }
}

/// Store outages are worth another attempt; anything else will fail the same way again.
fn classify(task: &'static str, err: DomainError) -> JobResult {
    match err {
        DomainError::Store(RepoError::Connection(msg) | RepoError::Query(msg)) => {
            tracing::warn!(task, error = %msg, "Task hit a store error, retrying");
            JobResult::Retry(msg)
        }
        other => {
            tracing::warn!(task, error = %other, "Task failed");
            JobResult::Failed(other.to_string())
        }
    }
}
