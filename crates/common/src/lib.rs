//! Shared building blocks for the bookstore services.
//!
//! Every service (users, books, carts) answers with the same JSON envelope,
//! maps errors the same way and authenticates callers through the user
//! service. This crate holds those pieces plus configuration, telemetry and
//! server lifecycle helpers.

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod routes;
pub mod server;
pub mod telemetry;
pub mod types;

pub use auth::{
    AuthContext, AuthError, AuthenticatedUser, Authenticator, CurrentUser, HttpAuthenticator,
    InMemoryAuthenticator, require_auth,
};
pub use config::{ConfigError, LogFormat, ServerConfig};
pub use envelope::{ApiResponse, ErrorBody};
pub use error::ApiError;
pub use extract::{Validate, ValidatedJson, ValidatedPath, ValidationError};
pub use types::{BookId, UserId};
