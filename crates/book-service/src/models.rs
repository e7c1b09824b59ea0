//! Book records and request schemas.

use common::extract::require_non_blank;
use common::{BookId, UserId, Validate, ValidationError};
use serde::{Deserialize, Serialize};

/// A catalog entry. Prices are in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub author: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    /// Superuser who created the entry.
    pub user_id: UserId,
}

/// Body of `POST /books/` and `PUT /books/{id}`.
///
/// An update replaces every editable field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookPayload {
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
}

impl Validate for BookPayload {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("author", &self.author)?;
        if self.price < 0 {
            return Err(ValidationError::new("price", "must not be negative"));
        }
        if self.stock < 0 {
            return Err(ValidationError::new("stock", "must not be negative"));
        }
        Ok(())
    }
}

/// Body of `PATCH /books/adjust_stock/{id}`.
///
/// A positive quantity takes stock out, a negative one puts it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStockRequest {
    pub quantity: i32,
}

impl Validate for AdjustStockRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// `data` of a successful stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub new_stock: i32,
}
