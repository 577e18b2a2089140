//! Post handlers: manual drafts, edits, scheduling and deletion.

use actix_web::{HttpResponse, web};

use postline_core::domain::{DraftPost, Post, PostEdit};
use postline_core::error::DomainError;
use postline_shared::dto::{CreatePostRequest, SchedulePostRequest, UpdatePostRequest};

use super::{post_response, require};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

async fn load_owned(state: &AppState, owner: i64, id: i64) -> AppResult<Post> {
    state
        .posts
        .find_owned(owner, id)
        .await?
        .ok_or_else(|| {
            DomainError::NotFound {
                entity_type: "Post",
                id,
            }
            .into()
        })
}

async fn ensure_label_owned(state: &AppState, owner: i64, label_id: Option<i64>) -> AppResult<()> {
    let Some(label_id) = label_id else {
        return Ok(());
    };
    match state.labels.find_owned(owner, label_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!(
            "Label {label_id} does not exist"
        ))),
    }
}

fn concurrent_change(post_id: i64) -> AppError {
    tracing::warn!(post_id, "Post changed while it was being edited");
    AppError::Conflict("The post was changed in the meantime; reload and retry".to_string())
}

/// GET /api/posts
pub async fn list(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let posts = state.posts.list_by_owner(identity.user_id).await?;
    let body: Vec<_> = posts.into_iter().map(post_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    require("text", &req.text)?;
    require("hashtags", &req.hashtags)?;

    let mut created = state
        .posts
        .create_drafts(
            identity.user_id,
            vec![DraftPost::new(req.text.trim(), req.hashtags.trim())],
        )
        .await?;
    let post = created
        .pop()
        .ok_or_else(|| AppError::Internal("draft insert returned no row".to_string()))?;

    tracing::info!(user_id = identity.user_id, post_id = post.id, "Draft created");
    Ok(HttpResponse::Created().json(post_response(post)))
}

/// GET /api/posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = load_owned(&state, identity.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PUT /api/posts/{id}
///
/// Replaces content and label, then schedules or unschedules depending on
/// whether `scheduled_for` is present.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    require("text", &req.text)?;
    require("hashtags", &req.hashtags)?;
    ensure_label_owned(&state, identity.user_id, req.label_id).await?;

    let mut post = load_owned(&state, identity.user_id, path.into_inner()).await?;
    let expected = post.status;
    post.apply_edit(PostEdit {
        text: req.text.trim().to_string(),
        hashtags: req.hashtags.trim().to_string(),
        label_id: req.label_id,
        scheduled_for: req.scheduled_for,
    })?;

    if !state.posts.save_edit(&mut post, expected).await? {
        return Err(concurrent_change(post.id));
    }

    tracing::info!(
        user_id = identity.user_id,
        post_id = post.id,
        status = %post.status,
        "Post updated"
    );
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// POST /api/posts/{id}/schedule
pub async fn schedule(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<SchedulePostRequest>,
) -> AppResult<HttpResponse> {
    let mut post = load_owned(&state, identity.user_id, path.into_inner()).await?;
    let expected = post.status;
    post.schedule(body.scheduled_for)?;

    if !state.posts.save_edit(&mut post, expected).await? {
        return Err(concurrent_change(post.id));
    }

    tracing::info!(
        user_id = identity.user_id,
        post_id = post.id,
        scheduled_for = %body.scheduled_for,
        "Post scheduled"
    );
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !state.posts.delete_owned(identity.user_id, id).await? {
        return Err(DomainError::NotFound {
            entity_type: "Post",
            id,
        }
        .into());
    }

    tracing::info!(user_id = identity.user_id, post_id = id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}
