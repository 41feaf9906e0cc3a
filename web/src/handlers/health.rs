//! Health check endpoints.
//!
//! Used by load balancers and orchestrators. Neither check inspects
//! dependencies; both answer as long as the process serves HTTP.

use axum::http::StatusCode;

/// Liveness check.
///
/// ```text
/// GET /healthz -> 200 "ok"
/// ```
#[allow(clippy::unused_async)]
pub async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check.
///
/// ```text
/// GET /readyz -> 200 "ready"
/// ```
#[allow(clippy::unused_async)]
pub async fn readyz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ready")
}
