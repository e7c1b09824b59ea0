//! Client for the book service.
//!
//! The cart service never touches book data directly: prices and stock are
//! read through [`BookCatalog::get_book`] and stock moves through
//! [`BookCatalog::adjust_stock`], both authenticated with the caller's token.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{ApiError, ApiResponse, BookId, ErrorBody};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// The parts of a book the cart service relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBook {
    pub id: BookId,
    pub name: String,
    pub price: i64,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
struct AdjustStock {
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct StockLevel {
    new_stock: i32,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Book with ID {0} not found")]
    NotFound(BookId),

    #[error("Book service rejected stock adjustment for book ID {book_id}: {status} {detail}")]
    Rejected {
        book_id: BookId,
        status: u16,
        detail: String,
    },

    #[error("Book service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed book service response: {0}")]
    MalformedResponse(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => ApiError::BadRequest(err.to_string()),
            CatalogError::Rejected { .. }
            | CatalogError::Unavailable(_)
            | CatalogError::MalformedResponse(_) => ApiError::internal(err),
        }
    }
}

/// Read and adjust book stock on behalf of an authenticated caller.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    async fn get_book(&self, id: BookId, token: &str) -> Result<CatalogBook, CatalogError>;

    /// Applies `stock - quantity` and returns the new stock. A negative
    /// quantity restocks.
    async fn adjust_stock(&self, id: BookId, quantity: i32, token: &str)
    -> Result<i32, CatalogError>;
}

/// Book catalog backed by the book service's REST API.
#[derive(Debug, Clone)]
pub struct HttpBookCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBookCatalog {
    /// `base_url` is the books collection URL, e.g. `http://127.0.0.1:9000/books/`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    async fn error_detail(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.detail,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        }
    }
}

#[async_trait]
impl BookCatalog for HttpBookCatalog {
    #[tracing::instrument(skip(self, token))]
    async fn get_book(&self, id: BookId, token: &str) -> Result<CatalogBook, CatalogError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(CatalogError::Unavailable(format!(
                "book service responded with {status}"
            )));
        }
        if !status.is_success() {
            tracing::info!(%status, "book lookup failed");
            return Err(CatalogError::NotFound(id));
        }

        let envelope: ApiResponse<CatalogBook> = response
            .json()
            .await
            .map_err(|e| CatalogError::MalformedResponse(e.to_string()))?;

        envelope
            .data
            .ok_or_else(|| CatalogError::MalformedResponse("book data missing".to_string()))
    }

    #[tracing::instrument(skip(self, token))]
    async fn adjust_stock(
        &self,
        id: BookId,
        quantity: i32,
        token: &str,
    ) -> Result<i32, CatalogError> {
        let response = self
            .client
            .patch(format!("{}adjust_stock/{}", self.base_url, id))
            .bearer_auth(token)
            .json(&AdjustStock { quantity })
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(CatalogError::Unavailable(format!(
                "book service responded with {status}"
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id));
        }
        if !status.is_success() {
            return Err(CatalogError::Rejected {
                book_id: id,
                status: status.as_u16(),
                detail: Self::error_detail(response).await,
            });
        }

        let envelope: ApiResponse<StockLevel> = response
            .json()
            .await
            .map_err(|e| CatalogError::MalformedResponse(e.to_string()))?;

        envelope
            .data
            .map(|level| level.new_stock)
            .ok_or_else(|| CatalogError::MalformedResponse("new_stock missing".to_string()))
    }
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    books: HashMap<BookId, CatalogBook>,
    fail_adjust_for: HashSet<BookId>,
    adjustments: Vec<(BookId, i32)>,
}

/// In-memory book catalog for testing.
///
/// Applies the same stock rules as the book service and records every
/// successful adjustment.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryBookCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, book: CatalogBook) {
        self.state.write().await.books.insert(book.id, book);
    }

    pub async fn stock(&self, id: BookId) -> Option<i32> {
        self.state.read().await.books.get(&id).map(|book| book.stock)
    }

    /// Makes every adjustment of `id` fail as if the book service were down.
    pub async fn set_fail_adjust(&self, id: BookId, fail: bool) {
        let mut state = self.state.write().await;
        if fail {
            state.fail_adjust_for.insert(id);
        } else {
            state.fail_adjust_for.remove(&id);
        }
    }

    /// Successful adjustments in the order they were applied.
    pub async fn adjustments(&self) -> Vec<(BookId, i32)> {
        self.state.read().await.adjustments.clone()
    }
}

#[async_trait]
impl BookCatalog for InMemoryBookCatalog {
    async fn get_book(&self, id: BookId, _token: &str) -> Result<CatalogBook, CatalogError> {
        self.state
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    async fn adjust_stock(
        &self,
        id: BookId,
        quantity: i32,
        _token: &str,
    ) -> Result<i32, CatalogError> {
        let mut state = self.state.write().await;

        if state.fail_adjust_for.contains(&id) {
            return Err(CatalogError::Unavailable(format!(
                "simulated failure adjusting book {id}"
            )));
        }

        let book = state.books.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        let new_stock = book.stock.checked_sub(quantity).ok_or_else(|| {
            CatalogError::Rejected {
                book_id: id,
                status: 400,
                detail: "Stock adjustment out of range".to_string(),
            }
        })?;
        if new_stock < 0 {
            return Err(CatalogError::Rejected {
                book_id: id,
                status: 400,
                detail: "Insufficient stock to adjust".to_string(),
            });
        }
        book.stock = new_stock;
        state.adjustments.push((id, quantity));

        Ok(new_stock)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    fn book(id: i64, stock: i32) -> CatalogBook {
        CatalogBook {
            id: BookId::new(id),
            name: format!("Book {id}"),
            price: 700,
            stock,
        }
    }

    #[tokio::test]
    async fn test_in_memory_adjustments() {
        let catalog = InMemoryBookCatalog::new();
        catalog.insert(book(1, 3)).await;

        assert_eq!(catalog.adjust_stock(BookId::new(1), 2, "t").await.unwrap(), 1);
        assert!(matches!(
            catalog.adjust_stock(BookId::new(1), 2, "t").await,
            Err(CatalogError::Rejected { status: 400, .. })
        ));
        assert_eq!(catalog.adjust_stock(BookId::new(1), -2, "t").await.unwrap(), 3);
        assert_eq!(
            catalog.adjustments().await,
            vec![(BookId::new(1), 2), (BookId::new(1), -2)]
        );
    }

    #[tokio::test]
    async fn test_in_memory_adjustment_out_of_range() {
        let catalog = InMemoryBookCatalog::new();
        catalog.insert(book(1, i32::MAX)).await;

        assert!(matches!(
            catalog.adjust_stock(BookId::new(1), -1, "t").await,
            Err(CatalogError::Rejected { status: 400, ref detail, .. })
                if detail == "Stock adjustment out of range"
        ));
        assert_eq!(catalog.stock(BookId::new(1)).await, Some(i32::MAX));
        assert!(catalog.adjustments().await.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_failure_toggle() {
        let catalog = InMemoryBookCatalog::new();
        catalog.insert(book(1, 3)).await;
        catalog.set_fail_adjust(BookId::new(1), true).await;

        assert!(matches!(
            catalog.adjust_stock(BookId::new(1), 1, "t").await,
            Err(CatalogError::Unavailable(_))
        ));
        assert_eq!(catalog.stock(BookId::new(1)).await, Some(3));

        catalog.set_fail_adjust(BookId::new(1), false).await;
        assert!(catalog.adjust_stock(BookId::new(1), 1, "t").await.is_ok());
    }

    #[test]
    fn test_catalog_error_status_mapping() {
        assert_eq!(
            ApiError::from(CatalogError::NotFound(BookId::new(4))),
            ApiError::BadRequest("Book with ID 4 not found".to_string())
        );
        assert_eq!(
            ApiError::from(CatalogError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let catalog = HttpBookCatalog::new(reqwest::Client::new(), "http://books.local/books");
        assert_eq!(catalog.base_url, "http://books.local/books/");
    }
}
