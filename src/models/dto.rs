//! # پاسخ‌های عمومی API
//!
//! همه پاسخ‌های موفق یک شکل دارن:
//!
//! ```json
//! { "status_code": 201, "success": true, "data": { ... }, "message": "Book added successfully" }
//! ```
//!
//! `ApiResponse` خودش `IntoResponse` هست و status code رو از همین فیلد میگیره،
//! پس handler‌ها فقط `Result<ApiResponse<T>>` برمیگردونن.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

// =====================================
// Response Envelope
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status_code: u16,

    /// `status_code < 400`
    pub success: bool,

    pub data: T,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            success: !(status.is_client_error() || status.is_server_error()),
            data,
            message: None,
        }
    }

    /// پاسخ `200 OK`
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// پاسخ `201 Created`
    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

// =====================================
// Health Check
// =====================================
/// وضعیت سرویس برای `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` یا `degraded`
    pub status: String,
    pub version: String,
    pub database: bool,
}

impl HealthResponse {
    #[must_use]
    pub fn from_database_check(database_ok: bool) -> Self {
        Self {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_carries_status() {
        let created = ApiResponse::created("x").with_message("done");
        assert_eq!(created.status_code, 201);
        assert!(created.success);

        let response = created.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_degraded_health() {
        let health = HealthResponse::from_database_check(false);
        assert_eq!(health.status, "degraded");
        assert!(!health.database);
    }
}
