//! Application error type and its HTTP mapping.
//!
//! Every fallible operation in the crate returns [`AppError`]. Callers branch on
//! [`AppError::kind`] rather than on message text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::utils::db_error::is_unique_violation_on_shortcode;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload rendered to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Classification of a failure, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-fixable input problem. Never retried.
    InvalidInput,
    /// No live link (or tag) for the given id/code/owner combination.
    NotFound,
    /// A caller-chosen shortcode collides with a live link.
    CodeTaken,
    /// Store, cache or random-source failure, or exhausted collision retries.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidInput { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    CodeTaken { message: String, details: Value },

    #[error("{message}")]
    Internal {
        message: String,
        details: Value,
        #[source]
        source: Option<BoxError>,
    },
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn code_taken(message: impl Into<String>, details: Value) -> Self {
        Self::CodeTaken {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
            source: None,
        }
    }

    /// Builds an internal error that keeps the underlying cause for logging.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            details: json!({}),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::CodeTaken { .. } => ErrorKind::CodeTaken,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self.kind() {
            ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, "invalid_input"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::CodeTaken => (StatusCode::CONFLICT, "code_taken"),
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Client-facing view of the error. Internal details never leave the process.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        match self {
            Self::InvalidInput { message, details }
            | Self::NotFound { message, details }
            | Self::CodeTaken { message, details } => ErrorInfo {
                code,
                message: message.clone(),
                details: details.clone(),
            },
            Self::Internal { .. } => ErrorInfo {
                code,
                message: "Internal server error".to_string(),
                details: json!({}),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        if let Self::Internal {
            message,
            details,
            source,
        } = &self
        {
            match source {
                Some(source) => tracing::error!(error = %source, %details, "{message}"),
                None => tracing::error!(%details, "{message}"),
            }
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation_on_shortcode(&e) {
            return AppError::code_taken("Short code is already taken", json!({}));
        }

        AppError::internal_with_source("Database error", e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(e.field_errors()).unwrap_or_else(|_| json!({}));
        AppError::invalid_input("Request validation failed", details)
    }
}
