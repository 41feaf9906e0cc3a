//! Axum integration shared by PulseCart HTTP services.
//!
//! Every service router is assembled from the same pieces:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  request_id_layer()                     │  ← X-Request-Id in/out, span
//! ├─────────────────────────────────────────┤
//! │  service routes                         │  ← handlers return AppError
//! │  /healthz, /readyz                      │  ← fixed 200 health checks
//! │  /metrics                               │  ← MetricsRegistry::render
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::{get, post}};
//! use pulsecart_web::{handlers, request_id_layer};
//!
//! let app = Router::new()
//!     .route("/v1/orders", post(create_order))
//!     .route("/healthz", get(handlers::healthz))
//!     .route("/readyz", get(handlers::readyz))
//!     .layer(request_id_layer());
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::AppError;
pub use extractors::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey};
pub use middleware::{REQUEST_ID_HEADER, RequestId, request_id_layer};
pub use server::{serve, serve_until};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
