//! # Quill Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use quill_server::observability::RequestIdMiddleware;
use quill_server::telemetry::{TelemetryConfig, init_telemetry};
use quill_server::{AppConfig, AppState, configure_routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::from_config(&config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    state
        .start_background_jobs()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    #[cfg(feature = "scheduler")]
    let mut scheduler = start_scheduler(&config, &state)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let timeout = config.request_timeout;
    let app_state = web::Data::new(state);

    let result = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(app_state.clone())
            .configure(configure_routes)
    })
    .client_request_timeout(timeout)
    .client_disconnect_timeout(timeout)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not stop cleanly");
    }

    result
}

#[cfg(feature = "scheduler")]
async fn start_scheduler(
    config: &AppConfig,
    state: &AppState,
) -> Result<quill_server::background::scheduler::Scheduler, tokio_cron_scheduler::JobSchedulerError>
{
    use quill_server::background::scheduler::{Scheduler, SchedulerConfig};

    let scheduler = Scheduler::new(SchedulerConfig::from_env()).await?;
    scheduler
        .add_recovery_sweep(&config.recovery_sweep_cron, state.users.clone())
        .await?;
    scheduler
        .add_rate_limit_prune(state.rate_limiter.clone())
        .await?;
    scheduler.start().await?;
    Ok(scheduler)
}
