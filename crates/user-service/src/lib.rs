//! User accounts service.
//!
//! Registers users, issues JWT access/refresh tokens and resolves tokens
//! to users on behalf of the book and cart services.

pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod routes;
pub mod store;
pub mod tokens;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;

pub use config::UserServiceConfig;
pub use password::PasswordHasher;
pub use routes::users::AppState;
pub use store::{InMemoryUserStore, PostgresUserStore, StoreError, UserStore};
pub use tokens::{TokenKind, TokenService};

/// Name reported by `/health`.
pub const SERVICE_NAME: &str = "user-service";

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: UserStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let app = Router::new()
        .route("/", get(routes::users::root))
        .route("/register", post(routes::users::register::<S>))
        .route("/login", post(routes::users::login::<S>))
        .route("/verify/{token}", get(routes::users::verify::<S>))
        .route("/user/{token}", get(routes::users::introspect::<S>))
        .route("/token/refresh", post(routes::users::refresh::<S>))
        .with_state(state);

    common::server::with_observability(app, SERVICE_NAME, metrics_handle)
}

/// Builds application state from configuration around `store`.
pub fn create_state<S: UserStore>(store: S, config: &UserServiceConfig) -> Arc<AppState<S>> {
    Arc::new(AppState {
        store,
        tokens: TokenService::new(
            config.secret_key.clone(),
            config.algorithm,
            config.access_token_ttl,
            config.refresh_token_ttl,
        ),
        hasher: PasswordHasher::new(config.bcrypt_cost),
        superuser_key: config.superuser_key.clone(),
        public_url: config.public_url.clone(),
    })
}
