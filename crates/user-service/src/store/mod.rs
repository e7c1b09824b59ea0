//! User persistence.

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;

use async_trait::async_trait;
use common::{ApiError, UserId};
use thiserror::Error;

use crate::models::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::BadRequest(err.to_string()),
            StoreError::NotFound => ApiError::NotFound(err.to_string()),
            StoreError::Database(_) | StoreError::Migration(_) => ApiError::internal(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage for user accounts.
///
/// Emails are unique; inserting a duplicate fails with
/// [`StoreError::DuplicateEmail`] regardless of races between requests.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user and returns it with its assigned id.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Sets `is_verified`. Fails with [`StoreError::NotFound`] for unknown ids.
    async fn mark_verified(&self, id: UserId) -> Result<User>;
}
