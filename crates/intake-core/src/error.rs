use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Build the shared JSON error body `{ "kind": ..., "message": ... }`.
///
/// Service error enums call this from their `IntoResponse` impl so every
/// service renders errors identically. Logging stays with the caller: tower-http
/// TraceLayer already records method/uri/status, and only the service knows
/// which variants carry a cause worth logging.
pub fn error_response(status: StatusCode, kind: &'static str, message: String) -> Response {
    let body = serde_json::json!({
        "kind": kind,
        "message": message,
    });
    (status, axum::Json(body)).into_response()
}
