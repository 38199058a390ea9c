//! Business logic services for the application layer.

pub mod link_service;
pub mod tag_service;

pub use link_service::{LinkPage, LinkService, LinkServiceConfig};
pub use tag_service::TagService;
