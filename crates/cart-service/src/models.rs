//! Cart records and request schemas.

use common::{BookId, UserId, Validate, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Database identifier of a cart (and of the order it becomes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(i64);

impl CartId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItemId(i64);

impl CartItemId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub book_id: BookId,
    pub quantity: i32,
    /// Line total: unit price times quantity when the line was last set.
    pub price: i64,
}

/// A user's cart. Once `is_ordered` is set it is an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub total_price: i64,
    pub total_quantity: i32,
    pub is_ordered: bool,
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new(id: CartId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            total_price: 0,
            total_quantity: 0,
            is_ordered: false,
            items: Vec::new(),
        }
    }

    /// Recomputes the totals from the current items.
    ///
    /// On overflow the cart is left unchanged.
    pub fn recalculate_totals(&mut self) -> Result<(), TotalOutOfRange> {
        let total_price = self
            .items
            .iter()
            .try_fold(0i64, |acc, item| acc.checked_add(item.price))
            .ok_or(TotalOutOfRange)?;
        let total_quantity = self
            .items
            .iter()
            .try_fold(0i32, |acc, item| acc.checked_add(item.quantity))
            .ok_or(TotalOutOfRange)?;

        self.total_price = total_price;
        self.total_quantity = total_quantity;
        Ok(())
    }
}

/// A cart total no longer fits its column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cart total out of range")]
pub struct TotalOutOfRange;

/// Body of `POST /cart/items/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AddItemRequest {
    pub book_id: BookId,
    pub quantity: i32,
}

impl Validate for AddItemRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity <= 0 {
            return Err(ValidationError::new("quantity", "must be greater than zero"));
        }
        Ok(())
    }
}
