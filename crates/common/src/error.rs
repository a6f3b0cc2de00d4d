//! Shared API error envelope
//!
//! Every Gatehouse error response uses the same JSON shape, rendered here so
//! per-crate error types only decide status, code, and message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Render the standard `{"error":{"code","message"}}` envelope.
pub fn envelope(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message,
        }
    }));

    (status, body).into_response()
}
