//! User service configuration.

use chrono::Duration;
use common::ServerConfig;
use common::config::{
    ConfigError, get_database_url, get_env_or_default, get_required_secret, parse_env_or,
};
use jsonwebtoken::Algorithm;
use secrecy::SecretString;

use crate::tokens::parse_hmac_algorithm;

/// Default listen port of the user service.
pub const DEFAULT_PORT: u16 = 8000;

/// Longest accepted token lifetime: ten years.
const MAX_TOKEN_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

/// Settings for the user service.
///
/// Reads from environment variables:
/// - `USER_DB_URL` (or `DATABASE_URL`) — PostgreSQL connection string
/// - `SECRET_KEY` — JWT signing secret
/// - `ALGORITHM` — JWT algorithm (default: `HS256`)
/// - `ACCESS_TOKEN_EXPIRE_MINUTES` (default: `30`)
/// - `REFRESH_TOKEN_EXPIRE_MINUTES` (default: `10080`)
/// - `SUPERUSER_KEY` — required to register superusers
/// - `PUBLIC_URL` — base of verification links (default: `http://127.0.0.1:8000`)
/// - `BCRYPT_COST` (default: `12`)
#[derive(Debug, Clone)]
pub struct UserServiceConfig {
    pub server: ServerConfig,
    pub database_url: SecretString,
    pub secret_key: SecretString,
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub superuser_key: SecretString,
    pub public_url: String,
    pub bcrypt_cost: u32,
}

impl UserServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let algorithm_name = get_env_or_default("ALGORITHM", "HS256");
        let algorithm = parse_hmac_algorithm(&algorithm_name)
            .map_err(|e| ConfigError::InvalidEnvVar("ALGORITHM".to_string(), e))?;

        Ok(Self {
            server: ServerConfig::from_env("USER_SERVICE_PORT", DEFAULT_PORT)?,
            database_url: get_database_url("USER_DB_URL")?,
            secret_key: get_required_secret("SECRET_KEY")?,
            algorithm,
            access_token_ttl: token_ttl("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_token_ttl: token_ttl("REFRESH_TOKEN_EXPIRE_MINUTES", 10_080)?,
            superuser_key: get_required_secret("SUPERUSER_KEY")?,
            public_url: get_env_or_default("PUBLIC_URL", "http://127.0.0.1:8000")
                .trim_end_matches('/')
                .to_string(),
            bcrypt_cost: parse_env_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

/// Reads a token lifetime in minutes, bounded to `1..=MAX_TOKEN_TTL_MINUTES`.
fn token_ttl(key: &str, default_minutes: i64) -> Result<Duration, ConfigError> {
    let minutes: i64 = parse_env_or(key, default_minutes)?;
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 1 and {MAX_TOKEN_TTL_MINUTES} minutes"),
        ));
    }
    Duration::try_minutes(minutes).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), "out of range".to_string())
    })
}
