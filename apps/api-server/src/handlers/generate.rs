//! Content generation handlers.
//!
//! Both endpoints are all-or-nothing: a generator failure (502) or an
//! unparseable reply (422) leaves no records behind.

use actix_web::{HttpResponse, web};

use postline_shared::ApiResponse;
use postline_shared::dto::{GenerateRequest, GeneratedBlogResponse};

use super::{blog_response, post_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/generate/posts
pub async fn posts(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<GenerateRequest>,
) -> AppResult<HttpResponse> {
    let posts = state
        .content
        .generate_posts(identity.user_id, &body.topic)
        .await?;

    let message = format!("Generated {} draft posts", posts.len());
    let posts: Vec<_> = posts.into_iter().map(post_response).collect();
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(posts, message)))
}

/// POST /api/generate/blog
pub async fn blog(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<GenerateRequest>,
) -> AppResult<HttpResponse> {
    let generated = state
        .content
        .generate_blog(identity.user_id, &body.topic)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(GeneratedBlogResponse {
        blog: blog_response(generated.blog),
        posts: generated.posts.into_iter().map(post_response).collect(),
    })))
}
