//! Router and shared state for the gateway.

use crate::forwarder::{ORDERS_PATH, OrdersForwarder, UpstreamResponse};
use crate::middleware::track_metrics;
use axum::{
    Router,
    body::Bytes,
    extract::{FromRef, State},
    http::HeaderMap,
    routing::{get, post},
};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_web::{AppError, WebResult, handlers, request_id_layer};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Upstream forwarder
    pub forwarder: Arc<OrdersForwarder>,
    /// Registry served on `/metrics`
    pub metrics: Arc<MetricsRegistry>,
}

impl FromRef<AppState> for Arc<MetricsRegistry> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.metrics)
    }
}

/// Build the gateway router.
///
/// Layers, outermost first: request ID, metrics, tracing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(ORDERS_PATH, post(forward_orders))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::render_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(Arc::clone(&state.metrics), track_metrics))
        .layer(request_id_layer())
        .with_state(state)
}

/// Proxy `POST /v1/orders` upstream.
async fn forward_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, axum::extract::rejection::BytesRejection>,
) -> WebResult<UpstreamResponse> {
    let body = body.map_err(|e| {
        state.metrics.inc("orders_forward_errors_total");
        AppError::bad_request("failed to read request body").with_source(e.into())
    })?;

    Ok(state.forwarder.forward(&headers, body).await?)
}
