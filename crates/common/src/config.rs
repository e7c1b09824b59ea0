//! Environment-driven configuration helpers shared by every service.
//!
//! Each service builds its own config struct from these helpers. A `.env`
//! file in the working directory is loaded first when present.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Bind address and logging settings common to every service.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `<SERVICE>_PORT` — listen port (default: per service)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `pretty` or `json` (default: `pretty`)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Loads server settings, using `port_var` for the listen port.
    pub fn from_env(port_var: &str, default_port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            host: parse_env_or("HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_env_or(port_var, default_port)?,
            log_level: get_env_or_default("RUST_LOG", "info"),
            log_format: parse_env_or("LOG_FORMAT", LogFormat::Pretty)?,
        })
    }

    /// Returns the socket address for binding the server.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Loads a `.env` file if present. Missing files are not an error.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }
}

/// Get a required environment variable.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
pub fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get a database URL, falling back to the generic `DATABASE_URL`.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
pub fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use serial_test::serial;

    use super::*;

    // Edition 2024 marks env mutation unsafe; these tests run serially so no
    // other thread reads the environment concurrently.
    fn set(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn unset(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    #[test]
    #[serial]
    fn test_server_defaults() {
        unset("HOST");
        unset("TEST_SERVICE_PORT");
        unset("LOG_FORMAT");

        let config = ServerConfig::from_env("TEST_SERVICE_PORT", 9000).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    #[serial]
    fn test_server_overrides() {
        set("HOST", "127.0.0.1");
        set("TEST_SERVICE_PORT", "8123");
        set("LOG_FORMAT", "json");

        let config = ServerConfig::from_env("TEST_SERVICE_PORT", 9000).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8123");
        assert_eq!(config.log_format, LogFormat::Json);

        unset("HOST");
        unset("TEST_SERVICE_PORT");
        unset("LOG_FORMAT");
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_reported() {
        set("TEST_SERVICE_PORT", "not-a-port");
        let err = ServerConfig::from_env("TEST_SERVICE_PORT", 9000).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "TEST_SERVICE_PORT"));
        unset("TEST_SERVICE_PORT");
    }

    #[test]
    #[serial]
    fn test_database_url_fallback() {
        unset("TEST_DB_URL");
        set("DATABASE_URL", "postgres://fallback/db");
        let url = get_database_url("TEST_DB_URL").unwrap();
        assert_eq!(url.expose_secret(), "postgres://fallback/db");

        set("TEST_DB_URL", "postgres://primary/db");
        let url = get_database_url("TEST_DB_URL").unwrap();
        assert_eq!(url.expose_secret(), "postgres://primary/db");

        unset("TEST_DB_URL");
        unset("DATABASE_URL");
        assert!(matches!(
            get_database_url("TEST_DB_URL"),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
