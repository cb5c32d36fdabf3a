//! Blog settings and first-run installation.

use actix_web::{HttpResponse, web};

use quill_shared::dto::SettingsDto;

use super::mapping::{settings_dto, settings_update};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/settings
pub async fn read(state: web::Data<AppState>, _identity: Identity) -> AppResult<HttpResponse> {
    let settings = state.settings.read().await?;
    Ok(HttpResponse::Ok().json(settings_dto(settings)))
}

/// POST /api/settings
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<SettingsDto>,
) -> AppResult<HttpResponse> {
    let settings = state
        .settings
        .apply(settings_update(body.into_inner()), Some(identity.user_id()))
        .await?;

    tracing::info!(user_id = identity.user_id(), "Settings updated");
    Ok(HttpResponse::Ok().json(settings_dto(settings)))
}

/// POST /api/installation - only while the blog has never been set up.
pub async fn install(
    state: web::Data<AppState>,
    body: web::Json<SettingsDto>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.install(settings_update(body.into_inner())).await?;

    tracing::info!(name = %settings.name, "Blog installed");
    Ok(HttpResponse::Ok().json(settings_dto(settings)))
}
