use async_trait::async_trait;
use common::UserId;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{Result, StoreError, UserStore};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str =
    "id, email, password, first_name, last_name, is_verified, is_superuser";

/// PostgreSQL-backed user store.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/users")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            is_verified: row.try_get("is_verified")?,
            is_superuser: row.try_get("is_superuser")?,
        })
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (email, password, first_name, last_name, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_user_email")
            {
                return StoreError::DuplicateEmail;
            }
            StoreError::Database(e)
        })?;

        Self::row_to_user(row)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_user)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_user)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn mark_verified(&self, id: UserId) -> Result<User> {
        sqlx::query(&format!(
            "UPDATE users SET is_verified = TRUE WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .map(Self::row_to_user)
        .transpose()?
        .ok_or(StoreError::NotFound)
    }
}
