use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BookId, UserId};
use tokio::sync::RwLock;

use super::{BookStore, Result, StoreError};
use crate::models::{Book, BookPayload};

#[derive(Debug, Default)]
struct Inner {
    books: BTreeMap<BookId, Book>,
    next_id: i64,
}

impl Inner {
    fn name_taken(&self, name: &str, except: Option<BookId>) -> bool {
        self.books
            .values()
            .any(|b| b.name == name && Some(b.id) != except)
    }
}

/// In-memory book store used by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, book: BookPayload, user_id: UserId) -> Result<Book> {
        let mut inner = self.inner.write().await;
        if inner.name_taken(&book.name, None) {
            return Err(StoreError::DuplicateName);
        }

        inner.next_id += 1;
        let book = Book {
            id: BookId::new(inner.next_id),
            name: book.name,
            author: book.author,
            description: book.description,
            price: book.price,
            stock: book.stock,
            user_id,
        };
        inner.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn list(&self) -> Result<Vec<Book>> {
        Ok(self.inner.read().await.books.values().cloned().collect())
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.inner.read().await.books.get(&id).cloned())
    }

    async fn update(&self, id: BookId, book: BookPayload) -> Result<Book> {
        let mut inner = self.inner.write().await;
        if !inner.books.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        if inner.name_taken(&book.name, Some(id)) {
            return Err(StoreError::DuplicateName);
        }

        let existing = inner.books.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        existing.name = book.name;
        existing.author = book.author;
        existing.description = book.description;
        existing.price = book.price;
        existing.stock = book.stock;
        Ok(existing.clone())
    }

    async fn delete(&self, id: BookId) -> Result<()> {
        self.inner
            .write()
            .await
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn adjust_stock(&self, id: BookId, quantity: i32) -> Result<i32> {
        let mut inner = self.inner.write().await;
        let book = inner.books.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        let new_stock = book
            .stock
            .checked_sub(quantity)
            .ok_or(StoreError::StockOutOfRange)?;
        if new_stock < 0 {
            return Err(StoreError::InsufficientStock);
        }

        book.stock = new_stock;
        Ok(new_stock)
    }
}
