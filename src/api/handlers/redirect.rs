//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a shortcode to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Public: no owner header is required. Resolution goes through the link
/// service's cache-aside path; cache trouble only costs latency.
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown, deleted, inactive or expired.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let url = state.link_service.resolve(&code).await?;
    Ok(Redirect::temporary(&url))
}
