//! # PulseCart Runtime
//!
//! Process-level support shared by every PulseCart binary.
//!
//! ## Core Components
//!
//! - **[`MetricsRegistry`]**: Per-service counters and duration summaries,
//!   rendered in Prometheus text exposition format
//! - **[`config`]**: Environment lookup helpers and the shared [`ServerConfig`]
//! - **[`logging`]**: `tracing` subscriber setup driven by `RUST_LOG` and
//!   `LOG_FORMAT`
//! - **[`shutdown_signal`]**: Resolves on Ctrl-C or SIGTERM
//!
//! ## Example
//!
//! ```
//! use pulsecart_runtime::MetricsRegistry;
//!
//! let metrics = MetricsRegistry::new("pulsecart_orders");
//! metrics.inc("create_order_requests_total");
//! assert!(metrics.render().contains("pulsecart_orders_create_order_requests_total 1"));
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::ServerConfig;
pub use logging::LogFormat;
pub use metrics::MetricsRegistry;

/// Resolve when the process receives Ctrl-C or, on Unix, SIGTERM.
///
/// Used as the graceful shutdown trigger for every server loop.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
