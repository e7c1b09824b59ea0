//! Cart persistence.

mod memory;
mod postgres;

pub use memory::InMemoryCartStore;
pub use postgres::PostgresCartStore;

use async_trait::async_trait;
use common::{ApiError, BookId, UserId};
use thiserror::Error;

use crate::models::{Cart, CartId, CartItem, CartItemId, TotalOutOfRange};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cart not found")]
    CartNotFound,

    #[error("Cart item not found")]
    ItemNotFound,

    #[error("Cart total out of range")]
    TotalOutOfRange,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CartNotFound | StoreError::ItemNotFound => {
                ApiError::NotFound(err.to_string())
            }
            StoreError::TotalOutOfRange => ApiError::BadRequest(err.to_string()),
            StoreError::Database(_) | StoreError::Migration(_) => ApiError::internal(err),
        }
    }
}

impl From<TotalOutOfRange> for StoreError {
    fn from(_: TotalOutOfRange) -> Self {
        StoreError::TotalOutOfRange
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage for carts and their items.
///
/// Each user has at most one open (not yet ordered) cart. Every mutation
/// of a cart's items also refreshes its totals.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's open cart with its items.
    async fn open_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Sets the line for `book_id` in the user's open cart, creating the
    /// cart if needed. An existing line is replaced, not added to.
    async fn upsert_item(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
        line_price: i64,
    ) -> Result<CartItem>;

    /// Removes an item from the user's open cart.
    async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<()>;

    /// Marks an open cart as ordered.
    async fn mark_ordered(&self, cart_id: CartId) -> Result<Cart>;

    /// All ordered carts of the user, oldest first.
    async fn ordered_carts(&self, user_id: UserId) -> Result<Vec<Cart>>;

    /// The user's most recent ordered cart.
    async fn latest_ordered_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Deletes a cart and its items.
    async fn delete_cart(&self, cart_id: CartId) -> Result<()>;
}
