use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BookId, UserId};
use tokio::sync::RwLock;

use super::{CartStore, Result, StoreError};
use crate::models::{Cart, CartId, CartItem, CartItemId};

#[derive(Debug, Default)]
struct Inner {
    carts: BTreeMap<CartId, Cart>,
    next_cart_id: i64,
    next_item_id: i64,
}

impl Inner {
    fn open_cart_mut(&mut self, user_id: UserId) -> Option<&mut Cart> {
        self.carts
            .values_mut()
            .find(|cart| cart.user_id == user_id && !cart.is_ordered)
    }
}

/// In-memory cart store used by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn open_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner
            .carts
            .values()
            .find(|cart| cart.user_id == user_id && !cart.is_ordered)
            .cloned())
    }

    async fn upsert_item(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
        line_price: i64,
    ) -> Result<CartItem> {
        let mut inner = self.inner.write().await;

        if inner.open_cart_mut(user_id).is_none() {
            inner.next_cart_id += 1;
            let cart = Cart::new(CartId::new(inner.next_cart_id), user_id);
            inner.carts.insert(cart.id, cart);
        }
        inner.next_item_id += 1;
        let fresh_id = CartItemId::new(inner.next_item_id);

        let cart = inner
            .open_cart_mut(user_id)
            .ok_or(StoreError::CartNotFound)?;

        let mut updated = cart.clone();
        let item = match updated.items.iter_mut().find(|item| item.book_id == book_id) {
            Some(existing) => {
                existing.quantity = quantity;
                existing.price = line_price;
                existing.clone()
            }
            None => {
                let item = CartItem {
                    id: fresh_id,
                    cart_id: updated.id,
                    book_id,
                    quantity,
                    price: line_price,
                };
                updated.items.push(item.clone());
                item
            }
        };
        updated.recalculate_totals()?;
        *cart = updated;

        Ok(item)
    }

    async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let cart = inner
            .open_cart_mut(user_id)
            .ok_or(StoreError::CartNotFound)?;

        let position = cart
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(StoreError::ItemNotFound)?;
        cart.items.remove(position);
        cart.recalculate_totals()?;
        Ok(())
    }

    async fn mark_ordered(&self, cart_id: CartId) -> Result<Cart> {
        let mut inner = self.inner.write().await;
        let cart = inner
            .carts
            .get_mut(&cart_id)
            .filter(|cart| !cart.is_ordered)
            .ok_or(StoreError::CartNotFound)?;
        cart.is_ordered = true;
        Ok(cart.clone())
    }

    async fn ordered_carts(&self, user_id: UserId) -> Result<Vec<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner
            .carts
            .values()
            .filter(|cart| cart.user_id == user_id && cart.is_ordered)
            .cloned()
            .collect())
    }

    async fn latest_ordered_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner
            .carts
            .values()
            .rev()
            .find(|cart| cart.user_id == user_id && cart.is_ordered)
            .cloned())
    }

    async fn delete_cart(&self, cart_id: CartId) -> Result<()> {
        self.inner
            .write()
            .await
            .carts
            .remove(&cart_id)
            .map(|_| ())
            .ok_or(StoreError::CartNotFound)
    }
}
