//! Registration, login, verification and token introspection endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::envelope::STATUS_SUCCESS;
use common::{ApiError, ApiResponse, AuthenticatedUser, UserId, ValidatedJson};
use secrecy::{ExposeSecret, SecretString};

use crate::error::verification_error;
use crate::models::{
    AuthResponse, LoginRequest, NewUser, RefreshRequest, RegisterParams, RegisterRequest, User,
};
use crate::password::PasswordHasher;
use crate::store::UserStore;
use crate::tokens::{TokenKind, TokenService};

/// Shared application state accessible from all handlers.
pub struct AppState<S: UserStore> {
    pub store: S,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
    pub superuser_key: SecretString,
    /// Base URL used to build verification links, without trailing slash.
    pub public_url: String,
}

impl<S: UserStore> AppState<S> {
    fn verification_link(&self, token: &str) -> String {
        format!("{}/verify/{}", self.public_url, token)
    }
}

fn auth_response(
    message: &str,
    user: &User,
    access_token: String,
    refresh_token: Option<String>,
) -> AuthResponse {
    AuthResponse {
        message: message.to_string(),
        status: STATUS_SUCCESS.to_string(),
        data: user.profile(),
        access_token,
        refresh_token,
    }
}

/// GET / — welcome message.
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the Book Store API!" }))
}

/// POST /register — create an account and return an access token.
///
/// The access token doubles as the email verification token.
#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn register<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RegisterParams>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if req.is_superuser {
        let key_matches = params
            .superuser_key
            .as_deref()
            .is_some_and(|key| key == state.superuser_key.expose_secret());
        if !key_matches {
            tracing::warn!("superuser registration with invalid key");
            return Err(ApiError::Forbidden("Invalid superuser key".to_string()));
        }
    }

    if state.store.find_by_email(&req.email).await?.is_some() {
        tracing::info!("attempt to register an existing email");
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = state.hasher.hash(&req.password).await?;
    let user = state
        .store
        .insert(NewUser {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            is_superuser: req.is_superuser,
        })
        .await?;

    let access_token = state.tokens.issue(&user, TokenKind::Access)?;
    tracing::info!(
        user_id = %user.id,
        link = %state.verification_link(&access_token),
        "user registered, verification link generated"
    );
    metrics::counter!("users_registered_total").increment(1);

    let body = auth_response("User registered successfully", &user, access_token, None);
    Ok((StatusCode::CREATED, Json(body)))
}

/// POST /login — exchange credentials for an access/refresh pair.
#[tracing::instrument(skip_all, fields(email = %req.email))]
pub async fn login<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let invalid = || ApiError::BadRequest("Invalid email or password".to_string());

    let Some(user) = state.store.find_by_email(&req.email).await? else {
        tracing::warn!("login attempt for unknown email");
        metrics::counter!("user_logins_total", "outcome" => "rejected").increment(1);
        return Err(invalid());
    };

    if !state.hasher.verify(&req.password, &user.password_hash).await? {
        tracing::warn!(user_id = %user.id, "login attempt with wrong password");
        metrics::counter!("user_logins_total", "outcome" => "rejected").increment(1);
        return Err(invalid());
    }

    let pair = state.tokens.issue_pair(&user)?;
    tracing::info!(user_id = %user.id, "user logged in");
    metrics::counter!("user_logins_total", "outcome" => "success").increment(1);

    let body = auth_response(
        "Login successful",
        &user,
        pair.access_token,
        Some(pair.refresh_token),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /verify/{token} — mark the token's owner as verified.
#[tracing::instrument(skip_all)]
pub async fn verify<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(token): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let claims = state.tokens.decode(&token).map_err(verification_error)?;

    let user = state
        .store
        .find_by_email(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.is_verified {
        return Ok(ApiResponse::message("User is already verified"));
    }

    state.store.mark_verified(user.id).await?;
    tracing::info!(user_id = %user.id, "user verified");

    Ok(ApiResponse::message("Email verified successfully!"))
}

/// GET /user/{token} — resolve an access token to its user.
///
/// Called by the book and cart services for every request they serve.
#[tracing::instrument(skip_all)]
pub async fn introspect<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(token): Path<String>,
) -> Result<ApiResponse<AuthenticatedUser>, ApiError> {
    let claims = state.tokens.decode_kind(&token, TokenKind::Access)?;

    let user = state
        .store
        .find_by_id(UserId::new(claims.user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    metrics::counter!("tokens_introspected_total").increment(1);
    Ok(ApiResponse::success("Authorization successful", user.profile()))
}

/// POST /token/refresh — trade a refresh token for a new pair.
#[tracing::instrument(skip_all)]
pub async fn refresh<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let claims = state
        .tokens
        .decode_kind(&req.refresh_token, TokenKind::Refresh)?;

    let user = state
        .store
        .find_by_id(UserId::new(claims.user_id))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    let pair = state.tokens.issue_pair(&user)?;
    tracing::debug!(user_id = %user.id, "tokens refreshed");

    let body = auth_response(
        "Token refreshed successfully",
        &user,
        pair.access_token,
        Some(pair.refresh_token),
    );
    Ok((StatusCode::CREATED, Json(body)))
}
