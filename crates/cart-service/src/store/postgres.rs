use std::collections::HashMap;

use async_trait::async_trait;
use common::{BookId, UserId};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

use super::{CartStore, Result, StoreError};
use crate::models::{Cart, CartId, CartItem, CartItemId};

const NUMERIC_OUT_OF_RANGE: &str = "22003";

const CART_COLUMNS: &str = "id, user_id, total_price, total_quantity, is_ordered";
const ITEM_COLUMNS: &str = "id, cart_id, book_id, quantity, price";

/// PostgreSQL-backed cart store.
#[derive(Debug, Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/carts")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_cart(row: &PgRow) -> Result<Cart> {
        Ok(Cart {
            id: CartId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            total_price: row.try_get("total_price")?,
            total_quantity: row.try_get("total_quantity")?,
            is_ordered: row.try_get("is_ordered")?,
            items: Vec::new(),
        })
    }

    fn row_to_item(row: &PgRow) -> Result<CartItem> {
        Ok(CartItem {
            id: CartItemId::new(row.try_get("id")?),
            cart_id: CartId::new(row.try_get("cart_id")?),
            book_id: BookId::new(row.try_get("book_id")?),
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
        })
    }

    /// Maps cart rows and attaches their items.
    async fn with_items(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<Cart>> {
        let mut carts = rows
            .iter()
            .map(Self::row_to_cart)
            .collect::<Result<Vec<_>>>()?;
        if carts.is_empty() {
            return Ok(carts);
        }

        let ids: Vec<i64> = carts.iter().map(|cart| cart.id.as_i64()).collect();
        let item_rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = ANY($1) ORDER BY id"
        ))
        .bind(ids.as_slice())
        .fetch_all(&mut *conn)
        .await?;

        let mut items: HashMap<CartId, Vec<CartItem>> = HashMap::new();
        for row in &item_rows {
            let item = Self::row_to_item(row)?;
            items.entry(item.cart_id).or_default().push(item);
        }
        for cart in &mut carts {
            cart.items = items.remove(&cart.id).unwrap_or_default();
        }

        Ok(carts)
    }

    async fn refresh_totals(conn: &mut PgConnection, cart_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE carts
            SET total_price = COALESCE((SELECT SUM(price) FROM cart_items WHERE cart_id = $1), 0),
                total_quantity = COALESCE((SELECT SUM(quantity) FROM cart_items WHERE cart_id = $1), 0)
            WHERE id = $1
            "#,
        )
        .bind(cart_id)
        .execute(&mut *conn)
        .await
        .map_err(Self::map_totals_error)?;
        Ok(())
    }

    fn map_totals_error(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE)
        {
            return StoreError::TotalOutOfRange;
        }
        StoreError::Database(e)
    }

    async fn fetch_carts(&self, sql: &str, user_id: UserId) -> Result<Vec<Cart>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(sql)
            .bind(user_id.as_i64())
            .fetch_all(&mut *conn)
            .await?;
        Self::with_items(&mut conn, rows).await
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    #[tracing::instrument(skip(self))]
    async fn open_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND NOT is_ordered");
        Ok(self.fetch_carts(&sql, user_id).await?.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    async fn upsert_item(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
        line_price: i64,
    ) -> Result<CartItem> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (user_id) VALUES ($1)
            ON CONFLICT (user_id) WHERE NOT is_ordered DO NOTHING
            "#,
        )
        .bind(user_id.as_i64())
        .execute(&mut *tx)
        .await?;

        let cart_id: i64 =
            sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1 AND NOT is_ordered")
                .bind(user_id.as_i64())
                .fetch_one(&mut *tx)
                .await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO cart_items (cart_id, book_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT unique_cart_book
            DO UPDATE SET quantity = EXCLUDED.quantity, price = EXCLUDED.price
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(cart_id)
        .bind(book_id.as_i64())
        .bind(quantity)
        .bind(line_price)
        .fetch_one(&mut *tx)
        .await?;

        Self::refresh_totals(&mut tx, cart_id).await?;
        tx.commit().await?;

        Self::row_to_item(&row)
    }

    #[tracing::instrument(skip(self))]
    async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let cart_id: i64 =
            sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1 AND NOT is_ordered")
                .bind(user_id.as_i64())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::CartNotFound)?;

        let deleted = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id.as_i64())
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::ItemNotFound);
        }

        Self::refresh_totals(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_ordered(&self, cart_id: CartId) -> Result<Cart> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!(
            "UPDATE carts SET is_ordered = TRUE WHERE id = $1 AND NOT is_ordered RETURNING {CART_COLUMNS}"
        ))
        .bind(cart_id.as_i64())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::CartNotFound)?;

        Self::with_items(&mut conn, vec![row])
            .await?
            .pop()
            .ok_or(StoreError::CartNotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn ordered_carts(&self, user_id: UserId) -> Result<Vec<Cart>> {
        let sql =
            format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND is_ordered ORDER BY id");
        self.fetch_carts(&sql, user_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn latest_ordered_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND is_ordered ORDER BY id DESC LIMIT 1"
        );
        Ok(self.fetch_carts(&sql, user_id).await?.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_cart(&self, cart_id: CartId) -> Result<()> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(cart_id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CartNotFound);
        }
        Ok(())
    }
}
