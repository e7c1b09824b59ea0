//! Book service configuration.

use common::ServerConfig;
use common::config::{ConfigError, get_database_url, get_env_or_default};
use secrecy::SecretString;

pub const DEFAULT_PORT: u16 = 9000;

/// Settings for the book service.
///
/// Reads from environment variables:
/// - `BOOKS_DB_URL` (or `DATABASE_URL`) — PostgreSQL connection string
/// - `AUTH_ENDPOINT` — user-service introspection prefix
///   (default: `http://127.0.0.1:8000/user/`)
#[derive(Debug, Clone)]
pub struct BookServiceConfig {
    pub server: ServerConfig,
    pub database_url: SecretString,
    pub auth_endpoint: String,
}

impl BookServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env("BOOK_SERVICE_PORT", DEFAULT_PORT)?,
            database_url: get_database_url("BOOKS_DB_URL")?,
            auth_endpoint: get_env_or_default("AUTH_ENDPOINT", "http://127.0.0.1:8000/user/"),
        })
    }
}
