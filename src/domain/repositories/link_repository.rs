//! Repository trait for short link data access.

use crate::domain::entities::{InsertOutcome, Link, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Store contract for links.
///
/// Every read filters out soft-deleted rows. Owner-scoped methods treat a link
/// owned by someone else exactly like a missing one. Links are returned with
/// their full tag set.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryStore`] - In-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link with a server-assigned id and timestamps.
    ///
    /// # Returns
    ///
    /// - `Ok(InsertOutcome::Created(link))` on success
    /// - `Ok(InsertOutcome::CodeConflict)` if a live link already uses the shortcode
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on any other store failure.
    async fn insert(&self, new_link: NewLink) -> Result<InsertOutcome, AppError>;

    /// Finds a live link by id, scoped to its owner.
    async fn find_by_id(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError>;

    /// Finds a live link by shortcode, scoped to its owner.
    async fn find_by_code(&self, code: &str, owner_id: &str) -> Result<Option<Link>, AppError>;

    /// Finds a live link by shortcode without an ownership check.
    ///
    /// Used by the public redirect path; the returned link carries no tags.
    async fn find_for_redirect(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Lists the owner's live links, newest first.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError>;

    /// Counts the owner's live links.
    async fn count_by_owner(&self, owner_id: &str) -> Result<i64, AppError>;

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// Only fields present in [`LinkPatch`] are modified.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if no live link matches `id` + `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeTaken`] if the new shortcode collides with a live link.
    /// Returns [`AppError::Internal`] on other store failures.
    async fn update(
        &self,
        id: Uuid,
        owner_id: &str,
        patch: LinkPatch,
    ) -> Result<Option<Link>, AppError>;

    /// Soft-deletes a link by setting `deleted_at = now()`.
    ///
    /// Returns the deleted row, or `Ok(None)` if nothing matched (already deleted,
    /// wrong owner or nonexistent).
    async fn soft_delete(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError>;

    /// Associates the owner's tags with a live link. Existing pairs and tag ids
    /// the owner does not have are ignored.
    async fn add_tags(&self, id: Uuid, owner_id: &str, tag_ids: &[Uuid]) -> Result<(), AppError>;

    /// Removes tag associations from a live link. Missing pairs are ignored.
    async fn remove_tags(
        &self,
        id: Uuid,
        owner_id: &str,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}
