//! Metrics and health check listener.

use axum::{Router, routing::get};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_web::handlers;
use std::sync::Arc;

/// `GET /metrics`, `GET /healthz` and `GET /readyz`.
pub fn build_metrics_router(metrics: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::render_metrics))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .with_state(metrics)
}
