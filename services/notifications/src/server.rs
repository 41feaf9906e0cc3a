//! Router for the notifications service.

use crate::notify;
use axum::{
    Router,
    routing::{get, post},
};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_web::{handlers, request_id_layer};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// `POST /v1/notify`, health checks and `/metrics`.
pub fn build_router(metrics: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route("/v1/notify", post(notify::notify))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(metrics)
}
