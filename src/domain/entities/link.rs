//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Tag;

/// A short link owned by a single user.
///
/// `is_active` and `expires_at` are stored independently; neither is derived
/// from the other. Use [`Link::is_live`] when both must be honoured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub id: Uuid,
    pub shortcode: String,
    pub original_url: String,
    pub owner_id: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
}

impl Link {
    /// Returns true if the link has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// A link may be redirected to only when active, unexpired and not deleted.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_deleted() && !self.is_expired_at(now)
    }
}

/// Input data for inserting a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub shortcode: String,
    pub original_url: String,
    pub owner_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of an insert attempt.
///
/// A shortcode collision with a live link is reported as [`InsertOutcome::CodeConflict`]
/// rather than as an error, so callers can decide whether to retry.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(Link),
    CodeConflict,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub shortcode: Option<String>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.shortcode.is_none() && self.is_active.is_none() && self.expires_at.is_none()
    }
}
