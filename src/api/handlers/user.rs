//! # User Handlers

use axum::extract::State;

use crate::{
    api::extractors::{AdminUser, AuthUser, ValidatedJson},
    error::Result,
    models::{ApiResponse, RegisterRequest, UserResponse},
    services::AppState,
};

/// پروفایل کاربر فعلی
///
/// # Endpoint
/// `GET /api/me`
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<ApiResponse<UserResponse>> {
    let user = state.auth_service.get_user(&claims.sub).await?;

    Ok(ApiResponse::ok(user))
}

/// لیست کاربران تایید شده
///
/// # Endpoint
/// `GET /api/users` (ادمین)
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<ApiResponse<Vec<UserResponse>>> {
    let users = state.auth_service.list_users().await?;

    Ok(ApiResponse::ok(users))
}

/// ثبت ادمین جدید
///
/// # Endpoint
/// `POST /api/users/admins` (ادمین)
pub async fn register_admin(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<UserResponse>> {
    let admin = state.auth_service.register_admin(request).await?;

    Ok(ApiResponse::created(admin).with_message("Admin registered successfully"))
}
