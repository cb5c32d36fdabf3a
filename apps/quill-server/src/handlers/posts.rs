//! Post handlers.

use actix_web::{HttpResponse, web};

use quill_shared::dto::{MessageResponse, PostRequest, SearchRequest};

use super::mapping::{post_draft, post_response, post_responses};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_published().await?;
    Ok(HttpResponse::Ok().json(post_responses(posts)))
}

/// POST /api/post
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    let post = state
        .posts
        .create(identity.user_id(), post_draft(body.into_inner()), &settings)
        .await?;

    tracing::info!(post_id = post.id, slug = %post.slug, "Post created");
    Ok(HttpResponse::Created().json(post_response(post)))
}

/// POST /api/post/search
pub async fn search(
    state: web::Data<AppState>,
    body: web::Json<SearchRequest>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    let posts = state.posts.search(&body.query, &settings).await?;
    Ok(HttpResponse::Ok().json(post_responses(posts)))
}

/// GET /api/post/{slug}
pub async fn read(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(&path, viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// POST /api/post/{slug}/edit
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    let post = state
        .posts
        .update(&path, identity.user_id(), post_draft(body.into_inner()), &settings)
        .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// GET /api/post/{slug}/publish
pub async fn publish(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.posts.publish(&path, identity.user_id()).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// GET /api/post/{slug}/unpublish
pub async fn unpublish(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.posts.unpublish(&path, identity.user_id()).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// GET /api/post/{slug}/delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.posts.delete(&path, identity.user_id()).await?;
    tracing::info!(key = %path, "Post deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted")))
}
