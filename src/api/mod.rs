//! # لایه API
//!
//! HTTP handlers و routing با axum.
//!
//! ## ساختار URL‌ها:
//! - `GET /health` - Health check
//! - `POST /api/auth/register` - ثبت‌نام و ارسال کد تایید
//! - `POST /api/auth/verify` - تایید حساب
//! - `POST /api/auth/login` - ورود
//! - `PATCH /api/auth/password/update` - تغییر رمز عبور
//! - `GET /api/me` - پروفایل کاربر
//! - `GET /api/books`, `GET /api/books/:id` - کاتالوگ
//! - `POST /api/books`, `DELETE /api/books/:id` - مدیریت کتاب (ادمین)
//! - `POST /api/borrows/record/:book_id` - ثبت امانت (ادمین)
//! - `PUT /api/borrows/return/:book_id` - ثبت بازگشت (ادمین)
//! - `GET /api/borrows` - دفتر کل (ادمین)
//! - `GET /api/borrows/me` - امانت‌های من
//! - `GET /api/users`, `POST /api/users/admins` - مدیریت کاربران (ادمین)

mod extractors;
mod handlers;
mod middleware;

pub use extractors::*;
pub use handlers::*;
pub use middleware::*;

use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::services::AppState;

// =====================================
// Router Builder
// =====================================
/// ساخت Router اصلی برنامه
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(handlers::health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_timing))
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

/// Route‌های API
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/books", book_routes())
        .nest("/borrows", borrow_routes())
        .nest("/users", user_routes())
        .route("/me", get(handlers::user::get_profile))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/verify", post(handlers::auth::verify_account))
        .route("/login", post(handlers::auth::login))
        .route("/password/update", patch(handlers::auth::update_password))
}

fn book_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::book::list_books).post(handlers::book::add_book),
        )
        .route(
            "/:id",
            get(handlers::book::get_book).delete(handlers::book::delete_book),
        )
}

fn borrow_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::borrow::all_borrow_records))
        .route("/me", get(handlers::borrow::my_borrowed_books))
        .route("/record/:book_id", post(handlers::borrow::record_borrow))
        .route("/return/:book_id", put(handlers::borrow::return_book))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::user::list_users))
        .route("/admins", post(handlers::user::register_admin))
}
