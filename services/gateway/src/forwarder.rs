//! Proxying of `POST /v1/orders` to the orders service.
//!
//! Two deadlines apply: the HTTP client's upstream timeout bounds the call to
//! the orders service, and a request timeout bounds the whole forward. Either
//! one firing is answered with 504; any other transport failure with 502.

use crate::config::UpstreamConfig;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_web::{AppError, IDEMPOTENCY_KEY_HEADER, REQUEST_ID_HEADER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Path proxied to the orders service.
pub const ORDERS_PATH: &str = "/v1/orders";

/// Inbound headers copied to the upstream request.
const FORWARDED_HEADERS: [&str; 3] = ["content-type", IDEMPOTENCY_KEY_HEADER, REQUEST_ID_HEADER];

/// Why a forward failed.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Upstream or request deadline exceeded.
    #[error("upstream timeout")]
    Timeout,

    /// Connection refused, reset, or any other transport failure.
    #[error("upstream request failed")]
    Unavailable(#[source] reqwest::Error),
}

impl From<ForwardError> for AppError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Timeout => Self::gateway_timeout(err.to_string()),
            ForwardError::Unavailable(_) => {
                let message = err.to_string();
                Self::bad_gateway(message).with_source(anyhow::Error::new(err))
            },
        }
    }
}

/// What the orders service answered.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Upstream status, passed through unchanged
    pub status: StatusCode,
    /// Upstream `Content-Type`, if any
    pub content_type: Option<HeaderValue>,
    /// Upstream body
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        match self.content_type {
            Some(content_type) => {
                response.headers_mut().insert(header::CONTENT_TYPE, content_type);
            },
            None => {
                response.headers_mut().remove(header::CONTENT_TYPE);
            },
        }
        response
    }
}

/// Forwards order requests to the orders service.
#[derive(Clone, Debug)]
pub struct OrdersForwarder {
    client: Client,
    orders_url: String,
    request_timeout: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl OrdersForwarder {
    /// Forwarder for `config`, recording into `metrics`.
    ///
    /// # Errors
    ///
    /// Returns the client build error, for example when no TLS backend can be
    /// initialised.
    pub fn new(config: &UpstreamConfig, metrics: Arc<MetricsRegistry>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.upstream_timeout).build()?;

        Ok(Self {
            client,
            orders_url: format!("{}{ORDERS_PATH}", config.orders_url.trim().trim_end_matches('/')),
            request_timeout: config.request_timeout,
            metrics,
        })
    }

    /// Upstream URL requests are forwarded to.
    #[must_use]
    pub fn orders_url(&self) -> &str {
        &self.orders_url
    }

    /// Forward `body` with the allow-listed `headers`.
    ///
    /// # Errors
    ///
    /// [`ForwardError::Timeout`] when either deadline is exceeded,
    /// [`ForwardError::Unavailable`] for other transport failures.
    pub async fn forward(&self, headers: &HeaderMap, body: Bytes) -> Result<UpstreamResponse, ForwardError> {
        self.metrics.inc("orders_forward_requests_total");

        let result = match tokio::time::timeout(self.request_timeout, self.send(headers, body)).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout),
        };

        match &result {
            Ok(response) => {
                tracing::debug!(status = %response.status, "Upstream answered");
            },
            Err(ForwardError::Timeout) => {
                self.metrics.inc("orders_forward_timeouts_total");
                tracing::warn!(url = %self.orders_url, "Upstream timeout");
            },
            Err(ForwardError::Unavailable(e)) => {
                self.metrics.inc("orders_forward_errors_total");
                tracing::warn!(url = %self.orders_url, error = %e, "Upstream request failed");
            },
        }

        result
    }

    async fn send(&self, headers: &HeaderMap, body: Bytes) -> Result<UpstreamResponse, ForwardError> {
        let mut request = self.client.post(&self.orders_url).body(body);
        for name in FORWARDED_HEADERS {
            if let Some(value) = forwarded_value(headers, name) {
                request = request.header(name, value);
            }
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(classify)?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Trimmed, non-blank value of `name`.
fn forwarded_value(headers: &HeaderMap, name: &str) -> Option<HeaderValue> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    HeaderValue::from_str(value).ok()
}

fn classify(err: reqwest::Error) -> ForwardError {
    if err.is_timeout() {
        ForwardError::Timeout
    } else {
        ForwardError::Unavailable(err)
    }
}
