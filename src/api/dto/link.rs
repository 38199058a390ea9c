//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::pagination::PaginationMeta;
use crate::api::dto::tag::TagResponse;
use crate::domain::entities::{Link, LinkPatch};

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Destination URL (absolute `http`/`https`).
    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub url: String,

    /// Caller-chosen shortcode. A random code is generated when absent.
    pub custom_code: Option<String>,

    /// Optional expiry timestamp; must be in the future.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for `PATCH /api/links/{id}`.
///
/// All fields are optional. Only provided fields are changed.
///
/// # `expires_at` semantics
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear expiry (link never expires)
/// - **Timestamp** → set new expiry
#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub shortcode: Option<String>,

    pub is_active: Option<bool>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        Self {
            shortcode: req.shortcode,
            is_active: req.is_active,
            expires_at: req.expires_at,
        }
    }
}

/// Request body for `POST/DELETE /api/links/{id}/tags`.
#[derive(Debug, Deserialize, Validate)]
pub struct LinkTagsRequest {
    #[validate(length(max = 100, message = "At most 100 tags per request"))]
    pub tag_ids: Vec<Uuid>,
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: Uuid,
    pub shortcode: String,
    pub original_url: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<TagResponse>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            shortcode: link.shortcode,
            original_url: link.original_url,
            is_active: link.is_active,
            expires_at: link.expires_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
            tags: link.tags.into_iter().map(TagResponse::from).collect(),
        }
    }
}

/// Paginated list of links.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<LinkResponse>,
}
