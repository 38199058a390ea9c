//! Caller identity extraction.
//!
//! Authentication happens upstream; this service only reads the owner id the
//! identity layer forwards in [`AppState::owner_header`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::state::AppState;

const MAX_OWNER_LENGTH: usize = 255;

/// Authenticated owner id of the current request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Owner(owner_id): Owner) { /* ... */ }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

/// Rejection for requests without a usable owner header.
#[derive(Debug)]
pub struct MissingOwner {
    header: String,
}

impl IntoResponse for MissingOwner {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": "unauthorized",
                "message": "Missing or invalid owner identity",
                "details": { "header": self.header },
            }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<AppState> for Owner {
    type Rejection = MissingOwner;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let rejection = || MissingOwner {
            header: state.owner_header.to_string(),
        };

        let owner = parts
            .headers
            .get(&state.owner_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_OWNER_LENGTH)
            .ok_or_else(rejection)?;

        Ok(Owner(owner.to_string()))
    }
}
