//! Environment-driven configuration helpers.
//!
//! Every service builds its `Config` through a lookup function rather than
//! reading `std::env` directly, so tests can supply variables from a map:
//!
//! ```
//! use pulsecart_runtime::config::{ServerConfig, parse_or};
//! use std::collections::HashMap;
//!
//! let vars = HashMap::from([("PORT", "9000"), ("SHUTDOWN_TIMEOUT", "oops")]);
//! let lookup = |key: &str| vars.get(key).map(|v| (*v).to_string());
//!
//! let server = ServerConfig::from_lookup(&lookup, 8081);
//! assert_eq!(server.port, 9000);
//! assert_eq!(server.shutdown_timeout.as_secs(), 10);
//! assert_eq!(parse_or(&lookup, "MISSING", 7_u32), 7);
//! ```
//!
//! Unset, blank, and unparseable values all fall back to the default.

use crate::logging::LogFormat;
use std::str::FromStr;
use std::time::Duration;

/// Default graceful shutdown budget.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Read the process environment; the lookup used by every `Config::from_env`.
#[must_use]
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Trimmed, non-blank value of `key`.
pub fn var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Value of `key`, or `default` when unset or blank.
pub fn string_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    var(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Parsed value of `key`, or `default` when unset, blank or invalid.
pub fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    var(lookup, key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Boolean flag: `1`, `true`, `yes` and `on` (any case) are true.
pub fn flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    var(lookup, key).is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Settings shared by every HTTP listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `LOG_FORMAT` and `SHUTDOWN_TIMEOUT` (seconds).
    pub fn from_lookup<F>(lookup: &F, default_port: u16) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: string_or(lookup, "HOST", "0.0.0.0"),
            port: parse_or(lookup, "PORT", default_port),
            log_format: parse_or(lookup, "LOG_FORMAT", LogFormat::Pretty),
            shutdown_timeout: Duration::from_secs(parse_or(
                lookup,
                "SHUTDOWN_TIMEOUT",
                DEFAULT_SHUTDOWN_TIMEOUT.as_secs(),
            )),
        }
    }

    /// `host:port` string for `TcpListener::bind`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
