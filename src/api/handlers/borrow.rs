//! # Borrow Handlers
//!
//! ثبت امانت و بازگشت کار ادمین (کتابدار) هست؛ کاربر فقط
//! تاریخچه خودش رو میبینه.

use axum::extract::{Path, State};

use crate::{
    api::extractors::{AdminUser, AuthUser, ValidatedJson},
    error::Result,
    models::{ApiResponse, BorrowRecord, BorrowRequest, BorrowedBook, ReturnReceipt},
    services::AppState,
};

/// ثبت امانت
///
/// # Endpoint
/// `POST /api/borrows/record/:book_id` (ادمین)
///
/// # Request Body
/// ```json
/// { "email": "reader@example.com" }
/// ```
pub async fn record_borrow(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(book_id): Path<String>,
    ValidatedJson(request): ValidatedJson<BorrowRequest>,
) -> Result<ApiResponse<BorrowRecord>> {
    let record = state.borrow_service.record_borrow(&book_id, request).await?;

    Ok(ApiResponse::created(record).with_message("Borrowed book recorded successfully"))
}

/// ثبت بازگشت و محاسبه جریمه
///
/// # Endpoint
/// `PUT /api/borrows/return/:book_id` (ادمین)
pub async fn return_book(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(book_id): Path<String>,
    ValidatedJson(request): ValidatedJson<BorrowRequest>,
) -> Result<ApiResponse<ReturnReceipt>> {
    let receipt = state
        .borrow_service
        .return_borrowed_book(&book_id, request)
        .await?;
    let message = receipt.message.clone();

    Ok(ApiResponse::ok(receipt).with_message(message))
}

/// دفتر کل امانت‌ها
///
/// # Endpoint
/// `GET /api/borrows` (ادمین)
pub async fn all_borrow_records(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<ApiResponse<Vec<BorrowRecord>>> {
    let records = state.borrow_service.all_borrow_records().await?;

    Ok(ApiResponse::ok(records))
}

/// امانت‌های کاربر فعلی
///
/// # Endpoint
/// `GET /api/borrows/me`
pub async fn my_borrowed_books(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<ApiResponse<Vec<BorrowedBook>>> {
    let entries = state.borrow_service.my_borrowed_books(&claims.sub).await?;

    Ok(ApiResponse::ok(entries))
}
