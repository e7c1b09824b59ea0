//! Cart and order endpoints.
//!
//! Every route runs behind [`common::require_auth`]; the caller's token is
//! forwarded to the book service on each catalog call.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{ApiError, ApiResponse, CurrentUser, ValidatedJson, ValidatedPath};

use crate::catalog::BookCatalog;
use crate::checkout::CartCoordinator;
use crate::models::{AddItemRequest, Cart, CartItem, CartItemId};
use crate::store::CartStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CartStore, C: BookCatalog> {
    pub coordinator: CartCoordinator<S, C>,
}

/// POST /cart/items/ — set a book's quantity in the caller's cart.
#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn add_item<S: CartStore + 'static, C: BookCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    CurrentUser(auth): CurrentUser,
    ValidatedJson(body): ValidatedJson<AddItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartItem>>), ApiError> {
    let item = state
        .coordinator
        .add_item(auth.user.id, body, &auth.token)
        .await?;

    Ok(ApiResponse::success("Cart item added successfully", item).with_status(StatusCode::CREATED))
}

/// GET /cart/ — the caller's open cart.
#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn get_cart<S: CartStore + 'static, C: BookCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    CurrentUser(auth): CurrentUser,
) -> Result<ApiResponse<Cart>, ApiError> {
    let cart = state
        .coordinator
        .store()
        .open_cart(auth.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart not found".to_string()))?;

    Ok(ApiResponse::success("Cart retrieved successfully", cart))
}

/// DELETE /cart/items/{item_id} — drop a line from the caller's open cart.
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn delete_item<S: CartStore + 'static, C: BookCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    CurrentUser(auth): CurrentUser,
    ValidatedPath(item_id): ValidatedPath<CartItemId>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .coordinator
        .store()
        .remove_item(auth.user.id, item_id)
        .await?;
    tracing::info!("cart item removed");

    Ok(ApiResponse::message("Cart item deleted successfully"))
}

/// PATCH /cart/place-order — order the caller's open cart.
#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn place_order<S: CartStore + 'static, C: BookCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    CurrentUser(auth): CurrentUser,
) -> Result<(StatusCode, Json<ApiResponse<Cart>>), ApiError> {
    let order = state
        .coordinator
        .place_order(auth.user.id, &auth.token)
        .await?;

    Ok(ApiResponse::success("Order placed successfully", order).with_status(StatusCode::CREATED))
}

/// GET /order-details — every order of the caller, oldest first.
#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn order_details<S: CartStore + 'static, C: BookCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    CurrentUser(auth): CurrentUser,
) -> Result<ApiResponse<Vec<Cart>>, ApiError> {
    let orders = state
        .coordinator
        .store()
        .ordered_carts(auth.user.id)
        .await?;
    if orders.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No order found for the user {}",
            auth.user.email
        )));
    }

    Ok(ApiResponse::success(
        "Order details fetched successfully",
        orders,
    ))
}

/// DELETE /cancel-order/ — cancel the caller's latest order.
#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn cancel_order<S: CartStore + 'static, C: BookCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    CurrentUser(auth): CurrentUser,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .coordinator
        .cancel_order(auth.user.id, &auth.token)
        .await?;

    Ok(ApiResponse::message(
        "Order cancelled and stock restored successfully",
    ))
}
