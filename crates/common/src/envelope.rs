//! JSON envelope shared by every service response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Status marker carried in every successful envelope.
pub const STATUS_SUCCESS: &str = "success";

/// Status marker carried in every error envelope.
pub const STATUS_ERROR: &str = "error";

/// Success envelope: `{"message": ..., "status": "success", "data": ...}`.
///
/// `data` is omitted for responses that only confirm an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Builds a success envelope carrying `data`.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            status: STATUS_SUCCESS.to_string(),
            data: Some(data),
        }
    }

    /// Pairs the envelope with a status code so handlers can return it directly.
    pub fn with_status(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }
}

impl ApiResponse<()> {
    /// Builds a success envelope without a `data` field.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: STATUS_SUCCESS.to_string(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Error envelope: `{"status": "error", "detail": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::success("Book created", 5)).unwrap();
        assert_eq!(body["message"], "Book created");
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"], 5);
    }

    #[test]
    fn test_message_only_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::message("Book deleted")).unwrap();
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_envelope_without_data_deserializes() {
        let parsed: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"message":"ok","status":"success"}"#).unwrap();
        assert!(parsed.data.is_none());
    }
}
