use async_trait::async_trait;
use common::{BookId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{BookStore, Result, StoreError};
use crate::models::{Book, BookPayload};

const BOOK_COLUMNS: &str = "id, name, author, description, price, stock, user_id";

/// SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// PostgreSQL-backed book store.
#[derive(Debug, Clone)]
pub struct PostgresBookStore {
    pool: PgPool,
}

impl PostgresBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/books")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_book(row: PgRow) -> Result<Book> {
        Ok(Book {
            id: BookId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            author: row.try_get("author")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            user_id: UserId::new(row.try_get("user_id")?),
        })
    }

    fn map_write_error(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.constraint() == Some("unique_book_name") {
                return StoreError::DuplicateName;
            }
            if db_err.constraint() == Some("books_stock_non_negative") {
                return StoreError::InsufficientStock;
            }
            if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
                return StoreError::StockOutOfRange;
            }
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl BookStore for PostgresBookStore {
    #[tracing::instrument(skip(self, book), fields(name = %book.name))]
    async fn insert(&self, book: BookPayload, user_id: UserId) -> Result<Book> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO books (name, author, description, price, stock, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.stock)
        .bind(user_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        Self::row_to_book(row)
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Book>> {
        sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_book)
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: BookId) -> Result<Option<Book>> {
        sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_book)
            .transpose()
    }

    #[tracing::instrument(skip(self, book))]
    async fn update(&self, id: BookId, book: BookPayload) -> Result<Book> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE books
            SET name = $2, author = $3, description = $4, price = $5, stock = $6
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.price)
        .bind(book.stock)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        row.map(Self::row_to_book)
            .transpose()?
            .ok_or(StoreError::NotFound(id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: BookId) -> Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn adjust_stock(&self, id: BookId, quantity: i32) -> Result<i32> {
        // Check and update in one statement so concurrent adjustments
        // cannot drive stock below zero.
        let new_stock: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET stock = stock - $2
            WHERE id = $1 AND stock - $2 >= 0
            RETURNING stock
            "#,
        )
        .bind(id.as_i64())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        if let Some(stock) = new_stock {
            return Ok(stock);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
            .bind(id.as_i64())
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Err(StoreError::InsufficientStock)
        } else {
            Err(StoreError::NotFound(id))
        }
    }
}
