//! Conversions from user-service errors into API responses.

use common::ApiError;

use crate::password::PasswordError;
use crate::tokens::TokenError;

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err)
    }
}

/// Maps token failures for endpoints that authenticate the caller.
///
/// `/verify/{token}` reports the same failures as 400 instead; see
/// [`verification_error`].
impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid => ApiError::Unauthorized(err.to_string()),
            TokenError::WrongKind { .. } => ApiError::Unauthorized("Invalid token type".to_string()),
            TokenError::Encoding(_) => ApiError::internal(err),
        }
    }
}

/// Token failures on the email verification link are client errors.
pub fn verification_error(err: TokenError) -> ApiError {
    match err {
        TokenError::Expired | TokenError::Invalid | TokenError::WrongKind { .. } => {
            ApiError::BadRequest(err.to_string())
        }
        TokenError::Encoding(_) => ApiError::internal(err),
    }
}
