//! Feeds of the published posts: JSON Feed, RSS 2.0 and Atom.

use actix_web::{HttpResponse, http::header, web};

use quill_shared::feed::JSON_FEED_CONTENT_TYPE;

use super::mapping::json_feed;
use super::syndication::{ATOM_CONTENT_TYPE, RSS_CONTENT_TYPE, atom_feed, rss_channel};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/feed
pub async fn read(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    let entries = state.posts.feed().await?;

    let body = serde_json::to_string(&json_feed(&settings, entries))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type(JSON_FEED_CONTENT_TYPE)
        .body(body))
}

/// GET /api/feeds/rss
pub async fn rss(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    let entries = state.posts.feed().await?;

    let body = rss_channel(&settings, &entries)
        .write_to(Vec::new())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().content_type(RSS_CONTENT_TYPE).body(body))
}

/// GET /api/feeds/atom
pub async fn atom(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let settings = state.settings.load().await?;
    let entries = state.posts.feed().await?;

    let body = atom_feed(&settings, &entries)
        .write_to(Vec::new())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().content_type(ATOM_CONTENT_TYPE).body(body))
}

/// GET /api/feeds - RSS is the default format.
pub async fn default_format() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/api/feeds/rss"))
        .finish()
}
