//! HTTP middleware and extractors for request processing.

pub mod owner;
pub mod tracing;

pub use owner::Owner;
