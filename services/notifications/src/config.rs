//! Configuration for the notifications service.

use pulsecart_runtime::config::{ServerConfig, env_lookup};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8082;

/// Notifications service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,
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
        Self {
            server: ServerConfig::from_lookup(lookup, DEFAULT_PORT),
        }
    }
}
