//! Utility functions for code generation and input validation.
//!
//! - [`code_generator`] - Random short code generation
//! - [`validation`] - URL, shortcode, expiry and tag name rules
//! - [`db_error`] - PostgreSQL error classification

pub mod code_generator;
pub mod db_error;
pub mod validation;
