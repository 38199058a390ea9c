//! Repository trait definitions for the domain layer.
//!
//! These traits are the narrow capability interfaces the services depend on,
//! so PostgreSQL, the in-memory store and test doubles are interchangeable.
//!
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for unit tests
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link storage, soft delete and tag association
//! - [`TagRepository`] - Owner-scoped tag management

pub mod link_repository;
pub mod tag_repository;

pub use link_repository::LinkRepository;
pub use tag_repository::TagRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use tag_repository::MockTagRepository;
