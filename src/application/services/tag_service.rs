//! Tag management service.

use crate::domain::entities::Tag;
use crate::domain::repositories::TagRepository;
use crate::error::AppError;
use crate::utils::validation::normalize_tag_name;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Service for the owner-scoped tag vocabulary.
///
/// Tag names are unique per owner; two owners may both have a tag called "work".
pub struct TagService<R: TagRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: TagRepository + ?Sized> TagService<R> {
    /// Creates a new tag service.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns the owner's tag with this name, creating it if needed.
    ///
    /// The name is trimmed before lookup, so `" work "` and `"work"` are the same tag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the trimmed name is empty or longer
    /// than 50 characters.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn create_tag(&self, owner_id: &str, name: &str) -> Result<Tag, AppError> {
        let name = normalize_tag_name(name)?;
        self.repository.get_or_create(owner_id, &name).await
    }

    /// Lists the owner's tags ordered by name.
    pub async fn list_tags(&self, owner_id: &str) -> Result<Vec<Tag>, AppError> {
        self.repository.list_by_owner(owner_id).await
    }

    /// Deletes one of the owner's tags, detaching it from every link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the owner has no tag with this id.
    pub async fn delete_tag(&self, owner_id: &str, id: Uuid) -> Result<(), AppError> {
        if self.repository.delete(id, owner_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Tag not found", json!({ "id": id })))
        }
    }
}
