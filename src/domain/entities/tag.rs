//! Tag entity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// An owner-scoped label. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
