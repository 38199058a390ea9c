//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - PostgreSQL link storage, soft delete and tag association
//! - [`PgTagRepository`] - PostgreSQL tag management
//! - [`InMemoryStore`] - In-process store implementing both traits with the same
//!   partial-uniqueness and soft-delete rules

pub mod memory;
pub mod pg_link_repository;
pub mod pg_tag_repository;

pub use memory::InMemoryStore;
pub use pg_link_repository::PgLinkRepository;
pub use pg_tag_repository::PgTagRepository;
