//! # Middleware
//!
//! Middleware‌های سفارشی که با `axum::middleware::from_fn` اضافه میشن.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::IntoResponse,
};
use tracing::{info, info_span, Instrument};

/// Header شناسه درخواست
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// تولید request ID جدید
#[must_use]
pub fn generate_request_id() -> String {
    nanoid::nanoid!(12)
}

// =====================================
// Request Timing Middleware
// =====================================
/// اندازه‌گیری و لاگ زمان پردازش request
pub async fn request_timing(request: Request<Body>, next: Next) -> impl IntoResponse {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

// =====================================
// Request ID Middleware
// =====================================
/// اضافه کردن Request ID به request و response
///
/// ID نامعتبر از کلاینت نادیده گرفته میشه و ID جدید ساخته میشه.
pub async fn request_id(mut request: Request<Body>, next: Next) -> impl IntoResponse {
    let header_value = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| v.to_str().map_or(false, |s| !s.is_empty() && s.len() <= 64))
        .cloned()
        .or_else(|| HeaderValue::from_str(&generate_request_id()).ok());

    let Some(header_value) = header_value else {
        return next.run(request).await;
    };

    let id = header_value.to_str().unwrap_or_default().to_string();
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value.clone());

    let mut response = next
        .run(request)
        .instrument(info_span!("request", request_id = %id))
        .await;

    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, header_value);

    response
}
