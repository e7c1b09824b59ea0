//! Cart coordination across the cart store and the book service.
//!
//! Placing and cancelling an order move stock in the book service one item
//! at a time. There is no distributed transaction: when a step fails, the
//! adjustments already applied are undone in reverse order, best effort.

use common::{ApiError, BookId, UserId};
use thiserror::Error;

use crate::catalog::{BookCatalog, CatalogError};
use crate::models::{AddItemRequest, Cart, CartItem};
use crate::store::{CartStore, StoreError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Requested quantity exceeds available stock")]
    QuantityExceedsStock,

    #[error("Line total out of range")]
    PriceOutOfRange,

    #[error("Cart is empty or already ordered.")]
    CartEmpty,

    #[error("Insufficient stock for book ID {0}")]
    InsufficientStock(BookId),

    #[error("Cart not found or empty")]
    NothingToCancel,

    #[error("Stock adjustment failed for book ID {book_id}: {source}")]
    Adjustment {
        book_id: BookId,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::QuantityExceedsStock
            | CheckoutError::PriceOutOfRange
            | CheckoutError::InsufficientStock(_) => ApiError::BadRequest(err.to_string()),
            CheckoutError::CartEmpty | CheckoutError::NothingToCancel => {
                ApiError::NotFound(err.to_string())
            }
            CheckoutError::Adjustment { .. } => ApiError::internal(err),
            CheckoutError::Catalog(e) => e.into(),
            CheckoutError::Store(e) => e.into(),
        }
    }
}

/// A stock movement that has been applied and may need undoing.
#[derive(Debug, Clone, Copy)]
struct Applied {
    book_id: BookId,
    quantity: i32,
}

/// Drives cart operations that span the cart store and the book catalog.
pub struct CartCoordinator<S: CartStore, C: BookCatalog> {
    store: S,
    catalog: C,
}

impl<S: CartStore, C: BookCatalog> CartCoordinator<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Puts a book in the user's open cart at its current price.
    #[tracing::instrument(skip(self, token), fields(book_id = %req.book_id))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        req: AddItemRequest,
        token: &str,
    ) -> Result<CartItem, CheckoutError> {
        let book = self.catalog.get_book(req.book_id, token).await?;
        if req.quantity > book.stock {
            return Err(CheckoutError::QuantityExceedsStock);
        }

        let line_price = book
            .price
            .checked_mul(i64::from(req.quantity))
            .ok_or(CheckoutError::PriceOutOfRange)?;

        let item = self
            .store
            .upsert_item(user_id, req.book_id, req.quantity, line_price)
            .await?;

        metrics::counter!("cart_items_added_total").increment(1);
        tracing::info!(item_id = %item.id, quantity = item.quantity, "cart item set");
        Ok(item)
    }

    /// Turns the user's open cart into an order, taking stock for each item.
    #[tracing::instrument(skip(self, token))]
    pub async fn place_order(&self, user_id: UserId, token: &str) -> Result<Cart, CheckoutError> {
        // 1. Load the open cart
        let cart = self
            .store
            .open_cart(user_id)
            .await?
            .filter(|cart| !cart.items.is_empty())
            .ok_or(CheckoutError::CartEmpty)?;

        // 2. Check stock for every item before touching any of it
        for item in &cart.items {
            let book = self.catalog.get_book(item.book_id, token).await?;
            if book.stock < item.quantity {
                return Err(CheckoutError::InsufficientStock(item.book_id));
            }
        }

        // 3. Take stock, item by item
        let mut applied = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            match self
                .catalog
                .adjust_stock(item.book_id, item.quantity, token)
                .await
            {
                Ok(new_stock) => {
                    tracing::debug!(book_id = %item.book_id, new_stock, "stock taken");
                    applied.push(Applied {
                        book_id: item.book_id,
                        quantity: item.quantity,
                    });
                }
                Err(source) => {
                    tracing::warn!(
                        book_id = %item.book_id,
                        error = %source,
                        "stock adjustment failed"
                    );
                    self.compensate(&applied, token).await;
                    return Err(CheckoutError::Adjustment {
                        book_id: item.book_id,
                        source,
                    });
                }
            }
        }

        // 4. Mark the cart ordered
        let ordered = match self.store.mark_ordered(cart.id).await {
            Ok(ordered) => ordered,
            Err(e) => {
                tracing::warn!(cart_id = %cart.id, error = %e, "marking cart ordered failed");
                self.compensate(&applied, token).await;
                return Err(e.into());
            }
        };

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(cart_id = %ordered.id, total_price = ordered.total_price, "order placed");
        Ok(ordered)
    }

    /// Cancels the user's most recent order, putting its stock back.
    #[tracing::instrument(skip(self, token))]
    pub async fn cancel_order(&self, user_id: UserId, token: &str) -> Result<Cart, CheckoutError> {
        let order = self
            .store
            .latest_ordered_cart(user_id)
            .await?
            .filter(|cart| !cart.items.is_empty())
            .ok_or(CheckoutError::NothingToCancel)?;

        let mut applied = Vec::with_capacity(order.items.len());
        for item in &order.items {
            match self
                .catalog
                .adjust_stock(item.book_id, -item.quantity, token)
                .await
            {
                Ok(_) => applied.push(Applied {
                    book_id: item.book_id,
                    quantity: -item.quantity,
                }),
                Err(source) => {
                    tracing::warn!(
                        book_id = %item.book_id,
                        error = %source,
                        "stock restore failed"
                    );
                    self.compensate(&applied, token).await;
                    return Err(CheckoutError::Adjustment {
                        book_id: item.book_id,
                        source,
                    });
                }
            }
        }

        if let Err(e) = self.store.delete_cart(order.id).await {
            tracing::warn!(cart_id = %order.id, error = %e, "deleting cancelled order failed");
            self.compensate(&applied, token).await;
            return Err(e.into());
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(cart_id = %order.id, "order cancelled");
        Ok(order)
    }

    /// Undoes applied stock movements in reverse order. Failures are logged
    /// and not retried.
    async fn compensate(&self, applied: &[Applied], token: &str) {
        for step in applied.iter().rev() {
            match self
                .catalog
                .adjust_stock(step.book_id, -step.quantity, token)
                .await
            {
                Ok(_) => {
                    metrics::counter!("stock_compensations_total", "outcome" => "ok").increment(1);
                }
                Err(e) => {
                    metrics::counter!("stock_compensations_total", "outcome" => "failed")
                        .increment(1);
                    tracing::error!(
                        book_id = %step.book_id,
                        quantity = step.quantity,
                        error = %e,
                        "stock compensation failed"
                    );
                }
            }
        }
    }
}
