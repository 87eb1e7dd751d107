//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`podstream_common::Error`] so that route
//! handlers can return `Result<T, AppError>` and use `?` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use podstream_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(Error);

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self(inner)
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self.0, "request failed");
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
