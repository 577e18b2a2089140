//! HTTP handlers and route configuration.

mod auth;
mod blog;
mod calendar;
mod generate;
mod health;
mod labels;
mod posts;


use actix_web::web;

use postline_core::domain::{BlogPost, Label, Post};
use postline_shared::dto::{BlogPostResponse, LabelResponse, PostResponse};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Authenticated routes
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete))
                    .route("/{id}/schedule", web::post().to(posts::schedule)),
            )
            .route("/calendar", web::get().to(calendar::events))
            .service(
                web::scope("/generate")
                    .route("/posts", web::post().to(generate::posts))
                    .route("/blog", web::post().to(generate::blog)),
            )
            .service(
                web::scope("/blog")
                    .route("", web::get().to(blog::list))
                    .route("/{id}", web::get().to(blog::get))
                    .route("/{id}", web::put().to(blog::update)),
            )
            .service(
                web::scope("/labels")
                    .route("", web::get().to(labels::list))
                    .route("", web::post().to(labels::create))
                    .route("/{id}", web::delete().to(labels::delete)),
            ),
    );
}

/// Malformed JSON bodies become RFC 7807 400s.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Reject blank required fields.
fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        text: post.text,
        hashtags: post.hashtags,
        status: post.status.to_string(),
        scheduled_for: post.scheduled_for,
        label_id: post.label_id,
        blog_post_id: post.blog_post_id,
        external_id: post.external_id,
        publish_attempts: post.publish_attempts,
        last_publish_error: post.last_publish_error,
        created_at: post.created_at,
    }
}

fn label_response(label: Label) -> LabelResponse {
    LabelResponse {
        id: label.id,
        name: label.name,
        color: label.color,
        created_at: label.created_at,
    }
}

fn blog_response(blog: BlogPost) -> BlogPostResponse {
    BlogPostResponse {
        id: blog.id,
        title: blog.title,
        content: blog.content,
        created_at: blog.created_at,
    }
}
