//! JWT issuing and decoding.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::User;

/// Which of the two token flavours a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claims carried by every token this service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Email of the user the token was issued to.
    pub sub: String,
    pub user_id: i64,
    pub token_type: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Expected {expected} token, got {actual}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Access and refresh token pair handed out at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    secret: SecretString,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(
        secret: SecretString,
        algorithm: Algorithm,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            secret,
            algorithm,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issues a single token of `kind` for `user`.
    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encoding("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user.email.clone(),
            user_id: user.id.as_i64(),
            token_type: kind,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

        tracing::debug!(user_id = %user.id, %kind, "token issued");
        Ok(token)
    }

    /// Issues a fresh access/refresh pair.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(user, TokenKind::Access)?,
            refresh_token: self.issue(user, TokenKind::Refresh)?,
        })
    }

    /// Verifies the signature and expiry and returns the claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }

    /// Like [`TokenService::decode`], additionally requiring `kind`.
    pub fn decode_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.token_type != kind {
            return Err(TokenError::WrongKind {
                expected: kind,
                actual: claims.token_type,
            });
        }
        Ok(claims)
    }
}

/// Parses an HMAC algorithm name (`HS256`, `HS384`, `HS512`).
///
/// Only shared-secret algorithms are accepted since the key is a string.
pub fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, String> {
    let algorithm: Algorithm = name
        .trim()
        .parse()
        .map_err(|_| format!("unknown JWT algorithm '{name}'"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(format!("unsupported JWT algorithm {other:?}, expected HS256/384/512")),
    }
}
