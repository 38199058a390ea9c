//! Application layer services implementing business logic.
//!
//! Services validate input, coordinate repository and cache calls, and map
//! outcomes to [`crate::error::AppError`] kinds. They consume repository traits
//! so HTTP handlers never touch storage directly.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, redirect resolution and management
//! - [`services::tag_service::TagService`] - Owner-scoped tag vocabulary

pub mod services;
