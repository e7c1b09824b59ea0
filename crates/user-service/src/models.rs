//! User records and request schemas.

use common::extract::require_non_blank;
use common::{AuthenticatedUser, UserId, Validate, ValidationError};
use serde::{Deserialize, Serialize};

/// Maximum length of an email address (RFC 5321).
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// A persisted user account.
///
/// `password_hash` never leaves the service; responses use [`User::profile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_verified: bool,
    pub is_superuser: bool,
}

impl User {
    /// Public view of the account. Also the payload of token introspection.
    pub fn profile(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_verified: self.is_verified,
            is_superuser: self.is_superuser,
        }
    }
}

/// Account data ready to be inserted (password already hashed).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
}

/// Body of `POST /register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_superuser: bool,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require_non_blank("first_name", &self.first_name)?;
        require_non_blank("last_name", &self.last_name)
    }
}

/// Query string of `POST /register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterParams {
    pub superuser_key: Option<String>,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("email", &self.email)?;
        require_non_blank("password", &self.password)
    }
}

/// Body of `POST /token/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("refresh_token", &self.refresh_token)
    }
}

/// Envelope returned by register, login and refresh: the usual
/// `message`/`status`/`data` plus the issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub status: String,
    pub data: AuthenticatedUser,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Checks the structure of an email address.
///
/// One `@`, non-empty local part, and a domain containing a dot that
/// neither starts nor ends with it.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = |message: &str| ValidationError::new("email", message);

    if email.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if email.len() > EMAIL_MAX_LENGTH {
        return Err(invalid(&format!(
            "must be at most {EMAIL_MAX_LENGTH} characters"
        )));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("must contain an @ symbol"))?;

    if local.is_empty() {
        return Err(invalid("local part cannot be empty"));
    }
    if domain.is_empty() || domain.contains('@') {
        return Err(invalid("domain is not valid"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(())
}

/// Password policy: minimum length plus a letter, a digit and a symbol.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let invalid = |message: &str| ValidationError::new("password", message);

    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(invalid(&format!(
            "must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(invalid("must contain a letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("must contain a digit"));
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(invalid("must contain a special character"));
    }

    Ok(())
}
