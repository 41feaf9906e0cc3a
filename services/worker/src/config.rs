//! Configuration for the worker.

use pulsecart_core::{DEFAULT_IDEMPOTENCY_TTL, ORDERS_CREATED_TOPIC};
use pulsecart_runtime::config::{ServerConfig, env_lookup, flag, parse_or, string_or, var};
use std::str::FromStr;
use std::time::Duration;

/// Default port of the metrics and health check listener.
pub const DEFAULT_METRICS_PORT: u16 = 9091;

/// Which [`Notifier`](pulsecart_core::Notifier) the worker uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifierMode {
    /// POST to the notifications service.
    #[default]
    Http,
    /// Log the event only.
    Log,
}

impl FromStr for NotifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown notifier mode: {other}")),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Metrics listener settings; `port` comes from `WORKER_METRICS_PORT`
    pub server: ServerConfig,
    /// Redis URL for consumer-side reservations
    pub redis_url: String,
    /// How long a processed `order_id` stays reserved
    pub idempotency_ttl: Duration,
    /// Broker addresses (comma-separated)
    pub brokers: String,
    /// Topic carrying `OrdersCreated`
    pub topic: String,
    /// Consumer group ID
    pub consumer_group: String,
    /// Where a consumer group without committed offsets starts reading
    pub auto_offset_reset: String,
    /// Notifier selection
    pub notifier_mode: NotifierMode,
    /// Base URL of the notifications service
    pub notifications_url: String,
    /// Per-request notifier timeout
    pub notifier_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(&env_lookup)
    }

    /// Load configuration through `lookup`.
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut server = ServerConfig::from_lookup(lookup, DEFAULT_METRICS_PORT);
        server.port = parse_or(lookup, "WORKER_METRICS_PORT", DEFAULT_METRICS_PORT);

        let redis_url = var(lookup, "REDIS_URL").unwrap_or_else(|| {
            pulsecart_redis::url_from_addr(
                &string_or(lookup, "REDIS_ADDR", "localhost:6379"),
                flag(lookup, "REDIS_TLS_ENABLED"),
            )
        });

        Self {
            server,
            redis_url,
            idempotency_ttl: Duration::from_secs(parse_or(
                lookup,
                "IDEMPOTENCY_TTL_SECS",
                DEFAULT_IDEMPOTENCY_TTL.as_secs(),
            )),
            brokers: string_or(lookup, "REDPANDA_BROKERS", "localhost:9092"),
            topic: string_or(lookup, "ORDERS_CREATED_TOPIC", ORDERS_CREATED_TOPIC),
            consumer_group: string_or(lookup, "CONSUMER_GROUP", "pulsecart-worker"),
            auto_offset_reset: string_or(
                lookup,
                "CONSUMER_AUTO_OFFSET_RESET",
                pulsecart_redpanda::DEFAULT_AUTO_OFFSET_RESET,
            ),
            notifier_mode: parse_or(lookup, "NOTIFIER_MODE", NotifierMode::Http),
            notifications_url: string_or(lookup, "NOTIFICATIONS_URL", "http://localhost:8082"),
            notifier_timeout: Duration::from_millis(parse_or(lookup, "NOTIFIER_TIMEOUT_MS", 3000)),
        }
    }
}
