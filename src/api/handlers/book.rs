//! # Book Handlers

use axum::extract::{Path, State};

use crate::{
    api::extractors::{AdminUser, AuthUser, ValidatedJson},
    error::Result,
    models::{ApiResponse, Book, CreateBookRequest},
    services::AppState,
};

/// لیست کتاب‌ها
///
/// # Endpoint
/// `GET /api/books`
pub async fn list_books(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
) -> Result<ApiResponse<Vec<Book>>> {
    let books = state.book_service.list_books().await?;

    Ok(ApiResponse::ok(books))
}

/// # Endpoint
/// `GET /api/books/:id`
pub async fn get_book(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Book>> {
    let book = state.book_service.get_book(&id).await?;

    Ok(ApiResponse::ok(book))
}

/// افزودن کتاب
///
/// # Endpoint
/// `POST /api/books` (ادمین)
///
/// # Request Body
/// ```json
/// {
///   "title": "Dune",
///   "author": "Frank Herbert",
///   "description": "...",
///   "price": 100,
///   "quantity": 3
/// }
/// ```
pub async fn add_book(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidatedJson(request): ValidatedJson<CreateBookRequest>,
) -> Result<ApiResponse<Book>> {
    let book = state.book_service.add_book(request).await?;

    Ok(ApiResponse::created(book).with_message("Book added successfully"))
}

/// # Endpoint
/// `DELETE /api/books/:id` (ادمین)
pub async fn delete_book(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    state.book_service.delete_book(&id).await?;

    Ok(ApiResponse::ok(()).with_message("Book deleted successfully"))
}
