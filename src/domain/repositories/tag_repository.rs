//! Repository trait for owner-scoped tags.

use crate::domain::entities::Tag;
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Returns the owner's tag with this name, creating it if absent.
    async fn get_or_create(&self, owner_id: &str, name: &str) -> Result<Tag, AppError>;

    /// Lists the owner's tags ordered by name.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Tag>, AppError>;

    /// Deletes a tag and its link associations.
    ///
    /// Returns `Ok(false)` if the owner has no tag with this id.
    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<bool, AppError>;
}
