//! PostgreSQL cart store tests.
//!
//! These tests start a PostgreSQL container and are ignored by default.
//! Run with:
//!
//! ```bash
//! cargo test -p cart-service --test postgres_integration -- --ignored
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use cart_service::{CartStore, PostgresCartStore, StoreError};
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

/// Tests share one database, so each takes its own user ids.
static NEXT_USER: AtomicI64 = AtomicI64::new(1);

fn fresh_user() -> UserId {
    UserId::new(NEXT_USER.fetch_add(1, Ordering::SeqCst))
}

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
            PostgresCartStore::new(pool.clone())
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

async fn get_test_store() -> PostgresCartStore {
    let info = get_container_info().await;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();
    PostgresCartStore::new(pool)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn upsert_keeps_one_open_cart_and_replaces_lines() {
    let store = get_test_store().await;
    let user = fresh_user();

    let first = store.upsert_item(user, BookId::new(1), 2, 400).await.unwrap();
    let second = store.upsert_item(user, BookId::new(2), 1, 150).await.unwrap();
    assert_eq!(first.cart_id, second.cart_id);

    let replaced = store.upsert_item(user, BookId::new(1), 5, 1000).await.unwrap();
    assert_eq!(replaced.id, first.id);
    assert_eq!(replaced.quantity, 5);

    let cart = store.open_cart(user).await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_price, 1150);
    assert_eq!(cart.total_quantity, 6);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_upserts_share_one_cart() {
    let store = get_test_store().await;
    let user = fresh_user();

    let handles: Vec<_> = (1..=8)
        .map(|book| {
            let store = store.clone();
            tokio::spawn(async move { store.upsert_item(user, BookId::new(book), 1, 10).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let cart = store.open_cart(user).await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 8);
    assert_eq!(cart.total_quantity, 8);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn overflowing_total_rolls_back_the_upsert() {
    let store = get_test_store().await;
    let user = fresh_user();
    let half = i64::MAX / 2 + 1;

    store.upsert_item(user, BookId::new(1), 1, half).await.unwrap();
    assert!(matches!(
        store.upsert_item(user, BookId::new(2), 1, half).await,
        Err(StoreError::TotalOutOfRange)
    ));

    let cart = store.open_cart(user).await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_price, half);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn remove_item_is_scoped_to_the_owner() {
    let store = get_test_store().await;
    let owner = fresh_user();
    let other = fresh_user();

    let item = store.upsert_item(owner, BookId::new(3), 1, 99).await.unwrap();

    assert!(matches!(
        store.remove_item(other, item.id).await,
        Err(StoreError::CartNotFound)
    ));
    store.upsert_item(other, BookId::new(3), 1, 99).await.unwrap();
    assert!(matches!(
        store.remove_item(other, item.id).await,
        Err(StoreError::ItemNotFound)
    ));

    store.remove_item(owner, item.id).await.unwrap();
    let cart = store.open_cart(owner).await.unwrap().unwrap();
    assert!(cart.items.is_empty());
    assert_eq!((cart.total_price, cart.total_quantity), (0, 0));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn ordering_and_deleting_carts() {
    let store = get_test_store().await;
    let user = fresh_user();

    let first = store.upsert_item(user, BookId::new(1), 1, 100).await.unwrap();
    let ordered = store.mark_ordered(first.cart_id).await.unwrap();
    assert!(ordered.is_ordered);
    assert_eq!(ordered.items.len(), 1);
    assert!(matches!(
        store.mark_ordered(first.cart_id).await,
        Err(StoreError::CartNotFound)
    ));
    assert!(store.open_cart(user).await.unwrap().is_none());

    let second = store.upsert_item(user, BookId::new(2), 2, 300).await.unwrap();
    assert_ne!(second.cart_id, first.cart_id);
    store.mark_ordered(second.cart_id).await.unwrap();

    let orders = store.ordered_carts(user).await.unwrap();
    assert_eq!(
        orders.iter().map(|cart| cart.id).collect::<Vec<_>>(),
        vec![first.cart_id, second.cart_id]
    );
    let latest = store.latest_ordered_cart(user).await.unwrap().unwrap();
    assert_eq!(latest.id, second.cart_id);

    store.delete_cart(second.cart_id).await.unwrap();
    let latest = store.latest_ordered_cart(user).await.unwrap().unwrap();
    assert_eq!(latest.id, first.cart_id);
    assert!(matches!(
        store.delete_cart(second.cart_id).await,
        Err(StoreError::CartNotFound)
    ));
}
