//! HTTP handlers and route configuration.

mod feed;
mod health;
mod mapping;
mod posts;
mod settings;
mod syndication;
mod users;

use actix_web::{HttpResponse, error::InternalError, web};
use quill_shared::ErrorResponse;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::middleware::strict_json::StrictJson;

/// Largest accepted JSON body.
const JSON_LIMIT_BYTES: usize = 1024 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, req| {
            let body = ErrorResponse::bad_request(err.to_string()).with_instance(req.path());
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        let body = ErrorResponse::not_found(err.to_string()).with_instance(req.path());
        InternalError::from_response(err, HttpResponse::NotFound().json(body)).into()
    })
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(path_config())
            .wrap(StrictJson)
            .wrap(RateLimitMiddleware)
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/feed", web::get().to(feed::read))
            .route("/feeds", web::get().to(feed::default_format))
            .route("/feeds/", web::get().to(feed::default_format))
            .route("/feeds/rss", web::get().to(feed::rss))
            .route("/feeds/atom", web::get().to(feed::atom))
            // Posts
            .route("/posts", web::get().to(posts::list))
            .route("/post", web::post().to(posts::create))
            .route("/post/search", web::post().to(posts::search))
            .route("/post/{slug}", web::get().to(posts::read))
            .route("/post/{slug}/edit", web::post().to(posts::update))
            .route("/post/{slug}/publish", web::get().to(posts::publish))
            .route("/post/{slug}/unpublish", web::get().to(posts::unpublish))
            .route("/post/{slug}/delete", web::get().to(posts::delete))
            // Users and sessions; fixed paths before `/user/{id}`
            .route("/users", web::get().to(users::list))
            .route("/user", web::post().to(users::register))
            .route("/user/login", web::post().to(users::login))
            .route("/user/logout", web::get().to(users::logout))
            .route("/user/recover", web::post().to(users::recover))
            .route("/user/reset/{id}/{recovery}", web::post().to(users::reset))
            .route("/user/{id}", web::get().to(users::profile))
            // Settings
            .route("/settings", web::get().to(settings::read))
            .route("/settings", web::post().to(settings::update))
            .route("/installation", web::post().to(settings::install)),
    );
}
