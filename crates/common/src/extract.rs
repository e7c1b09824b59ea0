//! Request body and path extraction with schema validation.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::ApiError;

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Semantic checks run after a body deserialized successfully.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Rejects with 422 when a required string field is blank.
pub fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// JSON body extractor that also runs [`Validate`].
///
/// Wrong types, missing fields, malformed JSON and failed validation all
/// reject with 422 Unprocessable Entity.
///
/// # Example
///
/// ```rust,ignore
/// async fn create(ValidatedJson(body): ValidatedJson<CreateBook>) -> impl IntoResponse {
///     // body passed both deserialization and validation
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|err| ApiError::Validation(err.to_string()))?;

        Ok(Self(value))
    }
}

/// Path parameter extractor that rejects with 422 and the error envelope.
///
/// A segment that does not parse into `T` (e.g. `/books/abc` for a numeric
/// id) is a schema failure, not a missing route.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
