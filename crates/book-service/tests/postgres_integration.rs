//! PostgreSQL book store tests.
//!
//! These tests start a PostgreSQL container and are ignored by default.
//! Run with:
//!
//! ```bash
//! cargo test -p book-service --test postgres_integration -- --ignored
//! ```

use std::sync::Arc;

use book_service::{BookPayload, BookStore, PostgresBookStore, StoreError};
use common::{BookId, UserId};
use sqlx::postgres::PgPoolOptions;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{host}:{port}/postgres");

            let pool = PgPoolOptions::new()
                .connect(&connection_string)
                .await
                .unwrap();
            PostgresBookStore::new(pool.clone())
                .run_migrations()
                .await
                .unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresBookStore {
    let info = get_container_info().await;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();
    PostgresBookStore::new(pool)
}

fn payload(name: &str, stock: i32) -> BookPayload {
    BookPayload {
        name: name.to_string(),
        author: "N. K. Jemisin".to_string(),
        description: None,
        price: 1999,
        stock,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn insert_get_update_delete() {
    let store = get_test_store().await;

    let book = store
        .insert(payload("pg-fifth-season", 3), UserId::new(7))
        .await
        .unwrap();
    assert_eq!(book.user_id, UserId::new(7));
    assert_eq!(store.get(book.id).await.unwrap().unwrap(), book);

    let mut changes = payload("pg-fifth-season-2e", 9);
    changes.description = Some("Revised".to_string());
    let updated = store.update(book.id, changes).await.unwrap();
    assert_eq!(updated.stock, 9);
    assert_eq!(updated.description.as_deref(), Some("Revised"));

    store.delete(book.id).await.unwrap();
    assert!(store.get(book.id).await.unwrap().is_none());
    assert!(matches!(
        store.delete(book.id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_names_are_rejected() {
    let store = get_test_store().await;
    store
        .insert(payload("pg-obelisk-gate", 1), UserId::new(1))
        .await
        .unwrap();

    assert!(matches!(
        store.insert(payload("pg-obelisk-gate", 1), UserId::new(1)).await,
        Err(StoreError::DuplicateName)
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn adjust_stock_is_conditional() {
    let store = get_test_store().await;
    let book = store
        .insert(payload("pg-stone-sky", 2), UserId::new(1))
        .await
        .unwrap();

    assert_eq!(store.adjust_stock(book.id, 2).await.unwrap(), 0);
    assert!(matches!(
        store.adjust_stock(book.id, 1).await,
        Err(StoreError::InsufficientStock)
    ));
    assert_eq!(store.adjust_stock(book.id, -3).await.unwrap(), 3);
    assert!(matches!(
        store.adjust_stock(BookId::new(i64::MAX), 1).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_adjustments_never_oversell() {
    let store = get_test_store().await;
    let book = store
        .insert(payload("pg-broken-earth", 5), UserId::new(1))
        .await
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.adjust_stock(book.id, 1).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(store.get(book.id).await.unwrap().unwrap().stock, 0);
}
