//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: The database is unreachable or the cache
///   does not answer
///
/// A disabled cache counts as healthy; redirects simply go to the database.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "Redis connected" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = match state.link_service.check_store().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => {
            tracing::warn!(error = ?e, "Health check: database unreachable");
            CheckStatus::error("Database unreachable")
        }
    };

    let cache = match state.link_service.check_cache().await {
        None => CheckStatus::ok("Disabled"),
        Some(true) => CheckStatus::ok("Redis connected"),
        Some(false) => CheckStatus::error("Redis connection failed"),
    };

    let all_healthy = database.is_ok() && cache.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database, cache },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
