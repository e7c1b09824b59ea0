//! Book CRUD and stock adjustment endpoints.
//!
//! Every route runs behind [`common::require_auth`]; mutations of the
//! catalog itself are limited to superusers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{ApiError, ApiResponse, BookId, CurrentUser, ValidatedJson, ValidatedPath};

use crate::models::{AdjustStockRequest, Book, BookPayload, StockLevel};
use crate::store::BookStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: BookStore> {
    pub store: S,
}

/// POST /books/ — add a book to the catalog.
#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn create<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(auth): CurrentUser,
    ValidatedJson(body): ValidatedJson<BookPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Book>>), ApiError> {
    auth.user.require_superuser("create book")?;

    let book = state.store.insert(body, auth.user.id).await?;
    tracing::info!(book_id = %book.id, name = %book.name, "book created");
    metrics::counter!("books_created_total").increment(1);

    Ok(ApiResponse::success("Book created successfully", book).with_status(StatusCode::CREATED))
}

/// GET /books/ — list the whole catalog.
#[tracing::instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn list<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(auth): CurrentUser,
) -> Result<ApiResponse<Vec<Book>>, ApiError> {
    let books = state.store.list().await?;
    if books.is_empty() {
        return Err(ApiError::NotFound("No books found".to_string()));
    }

    tracing::debug!(count = books.len(), "books retrieved");
    Ok(ApiResponse::success("Books retrieved successfully", books))
}

/// GET /books/{id} — fetch one book.
#[tracing::instrument(skip(state))]
pub async fn get<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedPath(id): ValidatedPath<BookId>,
) -> Result<ApiResponse<Book>, ApiError> {
    let book = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book not found for ID {id}")))?;

    Ok(ApiResponse::success("Book retrieved successfully", book))
}

/// PUT /books/{id} — replace a book's details.
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.user.id))]
pub async fn update<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(auth): CurrentUser,
    ValidatedPath(id): ValidatedPath<BookId>,
    ValidatedJson(body): ValidatedJson<BookPayload>,
) -> Result<ApiResponse<Book>, ApiError> {
    auth.user.require_superuser("update book")?;

    let book = state.store.update(id, body).await?;
    tracing::info!(name = %book.name, "book updated");
    metrics::counter!("books_updated_total").increment(1);

    Ok(ApiResponse::success("Book updated successfully", book))
}

/// DELETE /books/{id} — remove a book.
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn delete<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(auth): CurrentUser,
    ValidatedPath(id): ValidatedPath<BookId>,
) -> Result<ApiResponse<()>, ApiError> {
    auth.user.require_superuser("delete book")?;

    state.store.delete(id).await?;
    tracing::info!("book deleted");
    metrics::counter!("books_deleted_total").increment(1);

    Ok(ApiResponse::message("Book deleted successfully"))
}

/// PATCH /books/adjust_stock/{id} — take stock out (positive quantity) or
/// put it back (negative quantity).
///
/// Used by the cart service while placing and cancelling orders.
#[tracing::instrument(skip(state, body), fields(quantity = body.quantity))]
pub async fn adjust_stock<S: BookStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedPath(id): ValidatedPath<BookId>,
    ValidatedJson(body): ValidatedJson<AdjustStockRequest>,
) -> Result<ApiResponse<StockLevel>, ApiError> {
    let new_stock = state.store.adjust_stock(id, body.quantity).await?;

    let direction = if body.quantity >= 0 { "out" } else { "in" };
    metrics::counter!("stock_adjustments_total", "direction" => direction).increment(1);
    tracing::info!(new_stock, "stock adjusted");

    Ok(ApiResponse::success(
        "Stock adjusted successfully",
        StockLevel { new_stock },
    ))
}
