//! Book persistence.

mod memory;
mod postgres;

pub use memory::InMemoryBookStore;
pub use postgres::PostgresBookStore;

use async_trait::async_trait;
use common::{ApiError, BookId, UserId};
use thiserror::Error;

use crate::models::{Book, BookPayload};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Book with this name already exists")]
    DuplicateName,

    #[error("Book not found for ID {0}")]
    NotFound(BookId),

    #[error("Insufficient stock to adjust")]
    InsufficientStock,

    #[error("Stock adjustment out of range")]
    StockOutOfRange,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName
            | StoreError::InsufficientStock
            | StoreError::StockOutOfRange => ApiError::BadRequest(err.to_string()),
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::Database(_) | StoreError::Migration(_) => ApiError::internal(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage for the book catalog.
///
/// Names are unique. Stock never goes below zero: [`BookStore::adjust_stock`]
/// checks and applies the change atomically.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Inserts a book owned by `user_id`.
    async fn insert(&self, book: BookPayload, user_id: UserId) -> Result<Book>;

    /// All books, ordered by id.
    async fn list(&self) -> Result<Vec<Book>>;

    async fn get(&self, id: BookId) -> Result<Option<Book>>;

    /// Replaces the editable fields of an existing book.
    async fn update(&self, id: BookId, book: BookPayload) -> Result<Book>;

    async fn delete(&self, id: BookId) -> Result<()>;

    /// Applies `stock = stock - quantity` and returns the new stock.
    ///
    /// Fails with [`StoreError::InsufficientStock`] instead of going
    /// negative.
    async fn adjust_stock(&self, id: BookId, quantity: i32) -> Result<i32>;
}
