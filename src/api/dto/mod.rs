//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs are deserialized with Serde and checked with `validator` for
//! shape only; business rules live in the services.

pub mod health;
pub mod link;
pub mod pagination;
pub mod tag;
