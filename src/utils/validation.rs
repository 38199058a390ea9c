//! Input validation rules shared by the services.
//!
//! All failures are reported as [`AppError::InvalidInput`].

use crate::error::AppError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;
use url::Url;

/// Maximum length of any shortcode, generated or custom.
pub const MAX_SHORTCODE_LENGTH: usize = 20;

/// Maximum length of a tag name after trimming.
pub const MAX_TAG_NAME_LENGTH: usize = 50;

/// Codes that would shadow routes of the HTTP layer.
const RESERVED_CODES: &[&str] = &["api", "health"];

/// Whether `code` collides with a route of the HTTP layer, ignoring case.
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
}

static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid"));

/// Validates a destination URL.
///
/// # Rules
///
/// - Non-empty and at most `max_length` characters
/// - Parses as an absolute URL
/// - Scheme is `http` or `https`
/// - Host is present and non-empty
///
/// The URL is stored exactly as submitted; no normalization is applied.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_url("https://example.com/a?b=c", 2048).is_ok());
/// assert!(validate_url("ftp://example.com", 2048).is_err());
/// assert!(validate_url("", 2048).is_err());
/// ```
pub fn validate_url(input: &str, max_length: usize) -> Result<(), AppError> {
    if input.trim().is_empty() {
        return Err(AppError::invalid_input(
            "URL must not be empty",
            json!({ "field": "url" }),
        ));
    }

    let length = input.chars().count();
    if length > max_length {
        return Err(AppError::invalid_input(
            format!("URL must be at most {max_length} characters"),
            json!({ "field": "url", "provided_length": length }),
        ));
    }

    let url = Url::parse(input).map_err(|e| {
        AppError::invalid_input(
            "Invalid URL format",
            json!({ "field": "url", "reason": e.to_string() }),
        )
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::invalid_input(
            "Only HTTP and HTTPS URLs are allowed",
            json!({ "field": "url", "scheme": url.scheme() }),
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(AppError::invalid_input(
            "URL must have a host",
            json!({ "field": "url" }),
        ));
    }

    Ok(())
}

/// Validates a caller-chosen shortcode.
///
/// # Rules
///
/// - Length: 1-20 characters
/// - Allowed characters: ASCII letters, digits, `-` and `_`
/// - Cannot be a reserved route segment
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    if code.is_empty() || code.len() > MAX_SHORTCODE_LENGTH {
        return Err(AppError::invalid_input(
            format!("Short code must be 1-{MAX_SHORTCODE_LENGTH} characters"),
            json!({ "field": "shortcode", "provided_length": code.len() }),
        ));
    }

    if !CUSTOM_CODE_REGEX.is_match(code) {
        return Err(AppError::invalid_input(
            "Short code can only contain letters, digits, hyphens and underscores",
            json!({ "field": "shortcode", "code": code }),
        ));
    }

    if is_reserved_code(code) {
        return Err(AppError::invalid_input(
            "This short code is reserved",
            json!({ "field": "shortcode", "code": code }),
        ));
    }

    Ok(())
}

/// Ensures an expiry timestamp lies strictly after `now`.
pub fn validate_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    if expires_at <= now {
        return Err(AppError::invalid_input(
            "Expiration must be in the future",
            json!({ "field": "expires_at", "expires_at": expires_at }),
        ));
    }

    Ok(())
}

/// Trims a tag name and checks its length, returning the stored form.
pub fn normalize_tag_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(AppError::invalid_input(
            format!("Tag name must be 1-{MAX_TAG_NAME_LENGTH} characters"),
            json!({ "field": "name" }),
        ));
    }

    Ok(trimmed.to_string())
}
