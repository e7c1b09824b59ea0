//! Bearer-token authentication against the user service.
//!
//! Book and cart services never decode tokens themselves. Every request's
//! token is handed to an [`Authenticator`] (normally [`HttpAuthenticator`],
//! which calls the user service's introspection endpoint) and the resolved
//! identity is stored in the request extensions by [`require_auth`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::types::UserId;

/// Identity of the caller as reported by the user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub is_superuser: bool,
}

impl AuthenticatedUser {
    /// Rejects with 403 unless the caller is a superuser.
    pub fn require_superuser(&self, action: &str) -> Result<(), ApiError> {
        if self.is_superuser {
            return Ok(());
        }
        tracing::warn!(email = %self.email, action, "non-superuser attempted privileged action");
        Err(ApiError::Forbidden(
            "Not authorized to perform this action".to_string(),
        ))
    }
}

/// Authenticated caller plus the raw token, kept so it can be forwarded
/// on service-to-service calls.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthenticatedUser,
    pub token: String,
}

/// Errors raised while authenticating a request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization token missing")]
    MissingToken,

    #[error("Invalid user")]
    Rejected,

    #[error("User data missing in response")]
    MissingUserData,

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::Rejected | AuthError::MissingUserData => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Unavailable(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Resolves a bearer token to the user it was issued for.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Authenticator backed by the user service's `GET {endpoint}{token}` route.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuthenticator {
    /// `endpoint` is the introspection URL prefix, e.g. `http://127.0.0.1:8000/user/`.
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    #[tracing::instrument(skip(self, token), fields(endpoint = %self.endpoint))]
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .client
            .get(format!("{}{}", self.endpoint, token))
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::Unavailable(format!(
                "auth service responded with {status}"
            )));
        }
        if status.is_client_error() {
            tracing::info!(%status, "token rejected by auth service");
            return Err(AuthError::Rejected);
        }

        let envelope: ApiResponse<AuthenticatedUser> = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        envelope.data.ok_or(AuthError::MissingUserData)
    }
}

/// In-memory authenticator for tests and local wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthenticator {
    users: Arc<RwLock<HashMap<String, AuthenticatedUser>>>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as a credential for `user`.
    pub async fn insert(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.users.write().await.insert(token.into(), user);
    }
}

#[async_trait]
impl Authenticator for InMemoryAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.users
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(AuthError::Rejected)
    }
}

/// Extracts the token from an `Authorization` header.
///
/// Accepts both `Bearer <token>` and a bare token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Middleware that authenticates every request it wraps.
///
/// ```rust,ignore
/// router.layer(axum::middleware::from_fn_with_state(authenticator, require_auth))
/// ```
pub async fn require_auth(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or(AuthError::MissingToken)?
        .to_string();

    let user = authenticator.authenticate(&token).await?;
    tracing::debug!(user_id = %user.id, "request authenticated");

    request.extensions_mut().insert(AuthContext { user, token });
    Ok(next.run(request).await)
}

/// Extractor for the caller authenticated by [`require_auth`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(auth): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.email)
/// }
/// ```
pub struct CurrentUser(pub AuthContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Self)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn superuser() -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::new(1),
            email: "admin@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Admin".to_string(),
            is_verified: true,
            is_superuser: true,
        }
    }

    #[test]
    fn test_bearer_prefix_is_stripped() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bare_token_is_accepted() {
        let headers = headers_with("abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_empty_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
    }

    #[test]
    fn test_require_superuser() {
        let mut user = superuser();
        assert!(user.require_superuser("create book").is_ok());

        user.is_superuser = false;
        let err = user.require_superuser("create book").unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_in_memory_authenticator() {
        let auth = InMemoryAuthenticator::new();
        auth.insert("good", superuser()).await;

        assert_eq!(auth.authenticate("good").await.unwrap().id, UserId::new(1));
        assert!(matches!(
            auth.authenticate("bad").await,
            Err(AuthError::Rejected)
        ));
    }

    #[test]
    fn test_auth_error_status_mapping() {
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
