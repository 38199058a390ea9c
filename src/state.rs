//! Shared application state injected into every handler.

use axum::http::HeaderName;
use std::sync::Arc;

use crate::application::services::{LinkService, TagService};
use crate::domain::repositories::{LinkRepository, TagRepository};

/// Services backing the HTTP surface.
///
/// Repositories are held as trait objects so the same router serves both the
/// PostgreSQL stack and the in-memory store used in tests.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub tag_service: Arc<TagService<dyn TagRepository>>,
    /// Header carrying the caller's owner id, set by the upstream identity layer.
    pub owner_header: HeaderName,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService<dyn LinkRepository>>,
        tag_service: Arc<TagService<dyn TagRepository>>,
        owner_header: HeaderName,
    ) -> Self {
        Self {
            link_service,
            tag_service,
            owner_header,
        }
    }
}
