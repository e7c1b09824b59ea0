//! Shopping cart and order service.
//!
//! Keeps one open cart per user and turns it into an order by moving stock
//! in the book service. Book data is never stored here beyond line prices.

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use common::{Authenticator, require_auth};
use metrics_exporter_prometheus::PrometheusHandle;

pub use catalog::{BookCatalog, CatalogBook, CatalogError, HttpBookCatalog, InMemoryBookCatalog};
pub use checkout::{CartCoordinator, CheckoutError};
pub use config::CartServiceConfig;
pub use models::{AddItemRequest, Cart, CartId, CartItem, CartItemId};
pub use routes::cart::AppState;
pub use store::{CartStore, InMemoryCartStore, PostgresCartStore, StoreError};

/// Name reported by `/health`.
pub const SERVICE_NAME: &str = "cart-service";

/// Creates the Axum application router with all routes and shared state.
///
/// Cart routes authenticate through `authenticator`; `/health` and
/// `/metrics` stay public.
pub fn create_app<S, C>(
    state: Arc<AppState<S, C>>,
    authenticator: Arc<dyn Authenticator>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: CartStore + 'static,
    C: BookCatalog + 'static,
{
    let app = Router::new()
        .route("/cart/", get(routes::cart::get_cart::<S, C>))
        .route("/cart/items/", post(routes::cart::add_item::<S, C>))
        .route(
            "/cart/items/{item_id}",
            delete(routes::cart::delete_item::<S, C>),
        )
        .route("/cart/place-order", patch(routes::cart::place_order::<S, C>))
        .route("/order-details", get(routes::cart::order_details::<S, C>))
        .route("/cancel-order/", delete(routes::cart::cancel_order::<S, C>))
        .route_layer(axum::middleware::from_fn_with_state(
            authenticator,
            require_auth,
        ))
        .with_state(state);

    common::server::with_observability(app, SERVICE_NAME, metrics_handle)
}

/// Creates application state around `store` and `catalog`.
pub fn create_state<S: CartStore, C: BookCatalog>(store: S, catalog: C) -> Arc<AppState<S, C>> {
    Arc::new(AppState {
        coordinator: CartCoordinator::new(store, catalog),
    })
}
