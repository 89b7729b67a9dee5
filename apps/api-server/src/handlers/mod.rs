//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;

use actix_web::{error, web};

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Malformed bodies are a 400 problem, not actix's plain-text default.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = match &err {
            error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            other => format!("Invalid JSON body: {other}"),
        };
        AppError::BadRequest(detail).into()
    })
}

/// An id that does not parse cannot name an existing resource.
fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Resource not found".to_string()).into())
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(path_config()).service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .wrap(RateLimitMiddleware)
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/user", web::get().to(auth::current_user)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_published))
                    .route("", web::post().to(posts::create_post))
                    // Must precede "/{id}".
                    .route("/user", web::get().to(posts::list_mine))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post)),
            )
            .service(
                web::scope("/comments")
                    .route("/post/{post_id}", web::get().to(comments::list_for_post))
                    .route("/{post_id}", web::post().to(comments::create_comment))
                    .route("/{id}", web::delete().to(comments::delete_comment)),
            ),
    );
}
