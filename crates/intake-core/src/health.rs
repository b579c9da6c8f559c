use axum::http::StatusCode;

/// `GET /healthz`: the process is up and serving requests.
///
/// Readiness depends on each service's backing stores, so services provide
/// their own `/readyz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
