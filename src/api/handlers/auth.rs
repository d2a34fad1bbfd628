//! # Auth Handlers

use axum::extract::State;

use crate::{
    api::extractors::{AuthUser, ValidatedJson},
    error::Result,
    models::{
        ApiResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
        UpdatePasswordRequest, UserResponse, VerifyAccountRequest,
    },
    services::AppState,
};

// =====================================
// Register
// =====================================
/// ثبت‌نام کاربر جدید
///
/// # Endpoint
/// `POST /api/auth/register`
///
/// # Request Body
/// ```json
/// {
///   "name": "Ali",
///   "email": "ali@example.com",
///   "password": "securepassword"
/// }
/// ```
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<RegisterResponse>> {
    let response = state.auth_service.register(request).await?;
    let message = response.message.clone();

    Ok(ApiResponse::created(response).with_message(message))
}

// =====================================
// Verify Account
// =====================================
/// تایید حساب با کد ارسال شده
///
/// # Endpoint
/// `POST /api/auth/verify`
pub async fn verify_account(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerifyAccountRequest>,
) -> Result<ApiResponse<UserResponse>> {
    let user = state.auth_service.verify_account(request).await?;

    Ok(ApiResponse::ok(user).with_message("Account verified successfully"))
}

// =====================================
// Login
// =====================================
/// ورود کاربر
///
/// # Endpoint
/// `POST /api/auth/login`
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { ... },
///     "token": "eyJ...",
///     "expires_at": "2024-..."
///   }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    let response = state.auth_service.login(request).await?;

    Ok(ApiResponse::ok(response))
}

// =====================================
// Update Password
// =====================================
/// تغییر رمز عبور کاربر وارد شده
///
/// # Endpoint
/// `PATCH /api/auth/password/update`
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(request): ValidatedJson<UpdatePasswordRequest>,
) -> Result<ApiResponse<()>> {
    state.auth_service.update_password(&claims.sub, request).await?;

    Ok(ApiResponse::ok(()).with_message("Password updated successfully"))
}
