//! Label handlers.

use actix_web::{HttpResponse, web};

use postline_core::domain::NewLabel;
use postline_core::error::DomainError;
use postline_shared::dto::CreateLabelRequest;

use super::{label_response, require};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/labels
pub async fn list(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let labels = state.labels.list_by_owner(identity.user_id).await?;
    let body: Vec<_> = labels.into_iter().map(label_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/labels
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateLabelRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    require("name", &req.name)?;
    require("color", &req.color)?;

    let label = state
        .labels
        .create(
            identity.user_id,
            NewLabel {
                name: req.name.trim().to_string(),
                color: req.color.trim().to_string(),
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(label_response(label)))
}

/// DELETE /api/labels/{id}
///
/// Posts carrying the label keep existing with no label.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !state.labels.delete_owned(identity.user_id, id).await? {
        return Err(DomainError::NotFound {
            entity_type: "Label",
            id,
        }
        .into());
    }

    tracing::info!(user_id = identity.user_id, label_id = id, "Label deleted");
    Ok(HttpResponse::NoContent().finish())
}
