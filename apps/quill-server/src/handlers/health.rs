//! Health check endpoint.

use actix_web::{HttpResponse, web};
use quill_shared::dto::{HealthResponse, JobStatsResponse};

use super::mapping::job_stats;
use crate::state::AppState;

/// Server status with background job counters.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let (status, jobs) = match state.jobs.stats().await {
        Ok(stats) => ("ok", job_stats(stats)),
        Err(e) => {
            tracing::warn!(error = %e, "Job queue stats unavailable");
            ("degraded", JobStatsResponse::default())
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        jobs,
    })
}
