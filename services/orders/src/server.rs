//! Router and shared state for the orders service.

use crate::api;
use crate::service::OrderService;
use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_web::{handlers, request_id_layer};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Order creation orchestrator
    pub service: Arc<OrderService>,
    /// Registry served on `/metrics`
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    /// State around `service`, exposing the registry it records into.
    #[must_use]
    pub fn new(service: OrderService) -> Self {
        let metrics = Arc::clone(service.metrics());
        Self {
            service: Arc::new(service),
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<MetricsRegistry> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.metrics)
    }
}

/// Build the orders router.
///
/// - `POST /v1/orders`
/// - `GET /healthz`, `GET /readyz`
/// - `GET /metrics`
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/orders", post(api::create_order))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
