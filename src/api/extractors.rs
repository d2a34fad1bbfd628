//! # Custom Extractors
//!
//! Extractor‌های سفارشی برای احراز هویت و JSON اعتبارسنجی شده.
//!
//! وقتی یه extractor به عنوان پارامتر handler تعریف میشه،
//! axum قبل از اجرای handler اجراش میکنه و اگه خطا بده handler صدا زده نمیشه.

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts},
    http::{header, request::Parts, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::AppError,
    models::Claims,
    services::{extract_token_from_header, AppState},
};

// =====================================
// Bearer Token Extractor
// =====================================
/// استخراج توکن از header Authorization
///
/// ```rust,ignore
/// async fn handler(BearerToken(token): BearerToken) -> ... {
///     // token حالا یه String هست
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = extract_token_from_header(auth_header).ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        Ok(BearerToken(token.to_string()))
    }
}

// =====================================
// Auth User Extractor
// =====================================
/// کاربر احراز هویت شده (هر نقشی)
///
/// توکن نامعتبر یا منقضی 401 برمیگردونه.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.auth_service.verify_token(&token)?;

        Ok(AuthUser(claims))
    }
}

// =====================================
// Admin User Extractor
// =====================================
/// کاربر با نقش ادمین؛ بقیه نقش‌ها 403 میگیرن
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;

        if !claims.role.is_admin() {
            return Err(AppError::Forbidden(format!(
                "User with this role ({}) is not allowed to access this resource",
                claims.role
            )));
        }

        Ok(AdminUser(claims))
    }
}

// =====================================
// JSON with Validation
// =====================================
/// استخراج JSON با اعتبارسنجی خودکار
///
/// ```rust,ignore
/// async fn handler(ValidatedJson(data): ValidatedJson<CreateBookRequest>) -> ... {
///     // data حتما valid هست
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

        data.validate()?;

        Ok(ValidatedJson(data))
    }
}
