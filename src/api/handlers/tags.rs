//! Handlers for tag endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::api::dto::tag::{CreateTagRequest, TagResponse};
use crate::api::middleware::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the caller's tag with this name, creating it if needed.
///
/// # Endpoint
///
/// `POST /api/tags` with `{"name": "work"}`
pub async fn create_tag_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(payload): Json<CreateTagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    let tag = state
        .tag_service
        .create_tag(&owner_id, &payload.name)
        .await?;

    Ok(Json(tag.into()))
}

/// `GET /api/tags`
pub async fn list_tags_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = state.tag_service.list_tags(&owner_id).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// Deletes a tag and detaches it from every link.
///
/// # Endpoint
///
/// `DELETE /api/tags/{id}`
pub async fn delete_tag_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.tag_service.delete_tag(&owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
