//! Configuration for the gateway.

use pulsecart_runtime::config::{ServerConfig, env_lookup, parse_or, string_or};
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default budget for a whole proxied request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default budget for the upstream call alone.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(3);

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Where the forwarder sends orders
    pub upstream: UpstreamConfig,
}

/// Upstream orders service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Base URL of the orders service
    pub orders_url: String,
    /// Deadline for the whole proxied request
    pub request_timeout: Duration,
    /// Deadline for the upstream HTTP call
    pub upstream_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            orders_url: "http://localhost:8081".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
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
        let defaults = UpstreamConfig::default();
        Self {
            server: ServerConfig::from_lookup(lookup, DEFAULT_PORT),
            upstream: UpstreamConfig {
                orders_url: string_or(lookup, "ORDERS_URL", &defaults.orders_url),
                request_timeout: millis_or(lookup, "REQUEST_TIMEOUT_MS", defaults.request_timeout),
                upstream_timeout: millis_or(lookup, "UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout),
            },
        }
    }
}

/// Positive millisecond duration; zero falls back to `default`.
fn millis_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, 0_u64) {
        0 => default,
        ms => Duration::from_millis(ms),
    }
}
