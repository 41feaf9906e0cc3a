//! Per-request metrics.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use pulsecart_runtime::MetricsRegistry;
use std::sync::Arc;
use std::time::Instant;

/// Count every request by final status and record its duration.
///
/// Install with `axum::middleware::from_fn_with_state`.
pub async fn track_metrics(State(metrics): State<Arc<MetricsRegistry>>, request: Request, next: Next) -> Response {
    let start = Instant::now();

    let response = next.run(request).await;

    metrics.inc("http_requests_total");
    metrics.inc(&format!("http_response_status_{}_total", response.status().as_u16()));
    metrics.observe_duration("http_request_duration", start.elapsed());

    response
}
