//! Cart service configuration.

use common::ServerConfig;
use common::config::{ConfigError, get_database_url, get_env_or_default};
use secrecy::SecretString;

pub const DEFAULT_PORT: u16 = 7000;

/// Settings for the cart service.
///
/// Reads from environment variables:
/// - `CARTS_DB_URL` (or `DATABASE_URL`) — PostgreSQL connection string
/// - `AUTH_ENDPOINT` — user-service introspection prefix
///   (default: `http://127.0.0.1:8000/user/`)
/// - `BOOK_SERVICES_URL` — book collection URL
///   (default: `http://127.0.0.1:9000/books/`)
#[derive(Debug, Clone)]
pub struct CartServiceConfig {
    pub server: ServerConfig,
    pub database_url: SecretString,
    pub auth_endpoint: String,
    pub book_service_url: String,
}

impl CartServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env("CART_SERVICE_PORT", DEFAULT_PORT)?,
            database_url: get_database_url("CARTS_DB_URL")?,
            auth_endpoint: get_env_or_default("AUTH_ENDPOINT", "http://127.0.0.1:8000/user/"),
            book_service_url: get_env_or_default(
                "BOOK_SERVICES_URL",
                "http://127.0.0.1:9000/books/",
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_defaults() {
        unsafe {
            std::env::set_var("CARTS_DB_URL", "postgres://localhost/carts");
            std::env::remove_var("CART_SERVICE_PORT");
            std::env::remove_var("BOOK_SERVICES_URL");
            std::env::remove_var("AUTH_ENDPOINT");
        }

        let config = CartServiceConfig::from_env().unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.book_service_url, "http://127.0.0.1:9000/books/");
        assert_eq!(config.auth_endpoint, "http://127.0.0.1:8000/user/");

        unsafe { std::env::remove_var("CARTS_DB_URL") }
    }
}
