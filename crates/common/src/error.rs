//! API error type with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::envelope::ErrorBody;

/// Generic message returned for every 500 so internals never leak.
pub const INTERNAL_ERROR_MESSAGE: &str = "Unexpected error occurred";

/// API-level error type that maps to HTTP responses.
///
/// Service-specific errors convert into this type; the variant picks the
/// status code and the message becomes the `detail` of the error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Business-rule violation (400).
    BadRequest(String),
    /// Missing or rejected credentials (401).
    Unauthorized(String),
    /// Authenticated but not allowed (403).
    Forbidden(String),
    /// Resource not found (404).
    NotFound(String),
    /// Request body failed schema validation (422).
    Validation(String),
    /// Internal failure (500). The message is logged, not returned.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Validation(msg)
            | ApiError::Internal(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => {
                tracing::debug!(%status, detail = %other, "request rejected");
                other.to_string()
            }
        };

        (status, Json(ErrorBody::new(detail))).into_response()
    }
}
