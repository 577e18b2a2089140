use actix_web::{HttpResponse, web};

use postline_core::error::DomainError;
use postline_shared::dto::UpdateBlogPostRequest;

use super::{blog_response, require};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn not_found(id: i64) -> AppError {
    DomainError::NotFound {
        entity_type: "BlogPost",
        id,
    }
    .into()
}

/// GET /api/blog
pub async fn list(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let blogs = state.blogs.list_by_owner(identity.user_id).await?;
    let body: Vec<_> = blogs.into_iter().map(blog_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/blog/{id}
pub async fn get(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let blog = state
        .blogs
        .find_owned(identity.user_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(HttpResponse::Ok().json(blog_response(blog)))
}

/// PUT /api/blog/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdateBlogPostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();
    require("title", &req.title)?;
    require("content", &req.content)?;

    let blog = state
        .blogs
        .update_owned(
            identity.user_id,
            id,
            req.title.trim().to_string(),
            req.content,
        )
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(HttpResponse::Ok().json(blog_response(blog)))
}
