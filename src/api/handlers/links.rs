//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::link::{
    CreateLinkRequest, LinkListResponse, LinkResponse, LinkTagsRequest, UpdateLinkRequest,
};
use crate::api::dto::pagination::{PaginationMeta, PaginationParams};
use crate::api::middleware::Owner;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link owned by the caller.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "custom_code": "launch",                 // optional
///   "expires_at": "2030-01-01T00:00:00Z"     // optional
/// }
/// ```
///
/// # Errors
///
/// - 400 for an invalid URL, custom code or expiry
/// - 409 if the custom code is taken
pub async fn create_link_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_short_link(
            &owner_id,
            &payload.url,
            payload.custom_code.as_deref(),
            payload.expires_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links?page=1&page_size=20`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Query(params): Query<PaginationParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let page = state
        .link_service
        .list_links(&owner_id, params.page(), params.page_size())
        .await?;

    Ok(Json(LinkListResponse {
        pagination: PaginationMeta {
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        },
        items: page.links.into_iter().map(LinkResponse::from).collect(),
    }))
}

/// Returns one of the caller's links with its tags.
///
/// # Endpoint
///
/// `GET /api/links/{id}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(&owner_id, id).await?;
    Ok(Json(link.into()))
}

/// Partially updates one of the caller's links.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// # Request Body
///
/// All fields are optional. Only provided fields are changed.
///
/// ```json
/// {
///   "shortcode": "new-code",
///   "is_active": false,
///   "expires_at": null        // null clears the expiry
/// }
/// ```
///
/// # Errors
///
/// - 404 if the link does not exist, is deleted or belongs to someone else
/// - 409 if the new shortcode is taken
pub async fn update_link_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state
        .link_service
        .update(&owner_id, id, payload.into())
        .await?;

    Ok(Json(link.into()))
}

/// Soft-deletes one of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// The shortcode stops redirecting immediately and becomes available again.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attaches tags to a link.
///
/// # Endpoint
///
/// `POST /api/links/{id}/tags` with `{"tag_ids": ["..."]}`
pub async fn add_link_tags_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkTagsRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .add_tags(&owner_id, id, &payload.tag_ids)
        .await?;

    Ok(Json(link.into()))
}

/// Detaches tags from a link.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}/tags` with `{"tag_ids": ["..."]}`
pub async fn remove_link_tags_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkTagsRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .remove_tags(&owner_id, id, &payload.tag_ids)
        .await?;

    Ok(Json(link.into()))
}
