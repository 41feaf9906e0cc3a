//! Prometheus metrics for observability and monitoring.
//!
//! Each service owns one [`MetricsRegistry`] and passes it explicitly to the
//! components that record into it. The registry wraps its own
//! [`PrometheusRecorder`] instead of installing a global one, so tests can
//! build isolated registries and assert on exact values.
//!
//! Two kinds of metric exist:
//!
//! - **Counters**: monotonically increasing `u64`
//! - **Durations**: histograms in seconds, exposed as a Prometheus summary
//!   under `<name>_seconds`
//!
//! Metric names are prefixed with the registry namespace, lowercased, and have
//! `-` and spaces replaced by `_`.
//!
//! # Example
//!
//! ```
//! use pulsecart_runtime::metrics::MetricsRegistry;
//! use std::time::Duration;
//!
//! let metrics = MetricsRegistry::new("pulsecart_worker");
//! metrics.inc("messages_received_total");
//! metrics.observe_duration("process_orders_created_duration", Duration::from_millis(250));
//!
//! let text = metrics.render();
//! assert!(text.contains("# TYPE pulsecart_worker_messages_received_total counter"));
//! assert!(text.contains("pulsecart_worker_process_orders_created_duration_seconds_count 1"));
//! ```

use metrics::{counter, histogram, with_local_recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::fmt;
use std::time::Duration;

/// Prometheus text exposition content type.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Registry of named counters and duration summaries backed by a local
/// Prometheus recorder.
pub struct MetricsRegistry {
    namespace: String,
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Create an empty registry whose metric names are prefixed with
    /// `namespace`.
    #[must_use]
    pub fn new(namespace: impl AsRef<str>) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        Self {
            namespace: sanitize(namespace.as_ref()),
            recorder,
            handle,
        }
    }

    /// Namespace prefix applied to every metric.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Increment counter `name` by one.
    pub fn inc(&self, name: &str) {
        self.add(name, 1);
    }

    /// Increment counter `name` by `delta`.
    pub fn add(&self, name: &str, delta: u64) {
        let key = self.key(name);
        with_local_recorder(&self.recorder, || counter!(key).increment(delta));
    }

    /// Record one observation of duration `name`.
    pub fn observe_duration(&self, name: &str, elapsed: Duration) {
        let key = format!("{}_seconds", self.key(name));
        with_local_recorder(&self.recorder, || histogram!(key).record(elapsed));
    }

    /// Current value of counter `name`, or zero if it was never incremented.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.sample(&self.key(name))
    }

    /// Number of observations recorded for duration `name`.
    #[must_use]
    pub fn duration_count(&self, name: &str) -> u64 {
        self.sample(&format!("{}_seconds_count", self.key(name)))
    }

    /// Render every metric in Prometheus text exposition format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }

    fn sample(&self, series: &str) -> u64 {
        self.render()
            .lines()
            .filter_map(|line| line.split_once(' '))
            .find(|(name, _)| *name == series)
            .and_then(|(_, value)| value.trim().parse::<f64>().ok())
            .map_or(0, as_count)
    }

    fn key(&self, name: &str) -> String {
        format!("{}_{}", self.namespace, sanitize(name))
    }
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: f64) -> u64 {
    value as u64
}

fn sanitize(name: &str) -> String {
    name.trim().to_lowercase().replace(['-', ' '], "_")
}
