//! Reusable HTTP handlers.

pub mod health;
pub mod metrics;

pub use health::{healthz, readyz};
pub use metrics::render_metrics;
