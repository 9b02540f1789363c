//! HTTP response helpers

use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::json_types::ErrorResponse;

/// Seconds a rejected producer should wait before retrying
const RETRY_AFTER_SECS: &str = "1";

/// Create error response
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    let response = ErrorResponse::new(error, message);
    (status, Json(response)).into_response()
}

/// 503 response carrying a `Retry-After` hint
pub fn unavailable_response(error: &str, message: impl Into<String>) -> Response {
    let mut response = error_response(StatusCode::SERVICE_UNAVAILABLE, error, message);
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
    response
}
