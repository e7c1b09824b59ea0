//! Book catalog service.
//!
//! Catalog CRUD for superusers, read access for every authenticated user,
//! and the stock adjustment endpoint the cart service relies on.

pub mod config;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use common::{Authenticator, require_auth};
use metrics_exporter_prometheus::PrometheusHandle;

pub use config::BookServiceConfig;
pub use models::{AdjustStockRequest, Book, BookPayload, StockLevel};
pub use routes::books::AppState;
pub use store::{BookStore, InMemoryBookStore, PostgresBookStore, StoreError};

/// Name reported by `/health`.
pub const SERVICE_NAME: &str = "book-service";

/// Creates the Axum application router with all routes and shared state.
///
/// Book routes authenticate through `authenticator`; `/health` and
/// `/metrics` stay public.
pub fn create_app<S: BookStore + 'static>(
    state: Arc<AppState<S>>,
    authenticator: Arc<dyn Authenticator>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let app = Router::new()
        .route(
            "/books/",
            get(routes::books::list::<S>).post(routes::books::create::<S>),
        )
        .route(
            "/books/{id}",
            get(routes::books::get::<S>)
                .put(routes::books::update::<S>)
                .delete(routes::books::delete::<S>),
        )
        .route(
            "/books/adjust_stock/{id}",
            patch(routes::books::adjust_stock::<S>),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            authenticator,
            require_auth,
        ))
        .with_state(state);

    common::server::with_observability(app, SERVICE_NAME, metrics_handle)
}

/// Creates application state around `store`.
pub fn create_state<S: BookStore>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState { store })
}
