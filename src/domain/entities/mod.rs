//! Core domain entities.
//!
//! - [`Link`] - A short code mapped to a destination URL, owned by one user
//! - [`Tag`] - An owner-scoped label attached to links
//!
//! Creation and mutation inputs are separate structs (`NewLink`, `LinkPatch`).

pub mod link;
pub mod tag;

pub use link::{InsertOutcome, Link, LinkPatch, NewLink};
pub use tag::Tag;
