//! User and session handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::UserId;
use quill_shared::dto::{
    LoginRequest, MessageResponse, RecoverRequest, RegisterUserRequest, ResetPasswordRequest,
};

use super::mapping::{auth_response, profile_response, registration};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/users
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let profiles = state.users.list().await?;
    let body: Vec<_> = profiles.into_iter().map(profile_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/user/{id}
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<UserId>,
) -> AppResult<HttpResponse> {
    let profile = state.users.profile(path.into_inner(), viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(profile_response(profile)))
}

/// POST /api/user - register and start a session.
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    let user = state
        .users
        .register(registration(body.into_inner()), &settings)
        .await?;
    let session = state.sessions.issue(&user).await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok(HttpResponse::Created().json(auth_response(session, user)))
}

/// POST /api/user/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let user = state.users.login(&body.email, &body.password).await?;
    let session = state.sessions.issue(&user).await?;
    Ok(HttpResponse::Ok().json(auth_response(session, user)))
}

/// GET /api/user/logout
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.sessions.revoke(identity.session()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out")))
}

/// POST /api/user/recover
pub async fn recover(
    state: web::Data<AppState>,
    body: web::Json<RecoverRequest>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    state.users.recover(&body.email, &settings).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "A password recovery link has been sent to your email address",
    )))
}

/// POST /api/user/reset/{id}/{recovery}
pub async fn reset(
    state: web::Data<AppState>,
    path: web::Path<(UserId, String)>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let (user_id, token) = path.into_inner();
    state
        .users
        .reset_password(user_id, &token, &body.password)
        .await?;

    tracing::info!(user_id, "Password reset");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password has been reset")))
}
