//! Metrics exposition endpoint.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use pulsecart_runtime::metrics::{CONTENT_TYPE, MetricsRegistry};
use std::sync::Arc;

/// Render the service's registry in Prometheus text format.
///
/// ```text
/// GET /metrics
/// ```
#[allow(clippy::unused_async)]
pub async fn render_metrics(State(metrics): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], metrics.render())
}
