//! Redis-backed idempotency store.
//!
//! Reservations are a single `SET key 1 NX PX <ttl>` so the check and the
//! write happen atomically on the server. A reply of `OK` means this caller
//! acquired the key; a nil reply means it was already held.
//!
//! Keys are namespaced with a per-store prefix:
//! - `orders:idempotency:{Idempotency-Key}` in the orders service
//! - `worker:orders-created:{order_id}` in the worker
//!
//! # Example
//!
//! ```no_run
//! use pulsecart_core::idempotency::{IdempotencyStore, PRODUCER_KEY_PREFIX};
//! use pulsecart_redis::RedisIdempotencyStore;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisIdempotencyStore::new("redis://127.0.0.1:6379", PRODUCER_KEY_PREFIX).await?;
//! let acquired = store.reserve("idem-1", Duration::from_secs(86_400)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use futures::future::BoxFuture;
use pulsecart_core::idempotency::{IdempotencyStore, ReservationError};
use redis::Client;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Build a connection URL from a bare `host:port` address.
///
/// `rediss://` is used when `tls` is set.
#[must_use]
pub fn url_from_addr(addr: &str, tls: bool) -> String {
    let scheme = if tls { "rediss" } else { "redis" };
    format!("{scheme}://{}", addr.trim())
}

/// Redis [`IdempotencyStore`] with a fixed key prefix.
#[derive(Clone)]
pub struct RedisIdempotencyStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    prefix: String,
}

impl RedisIdempotencyStore {
    /// Connect to `redis_url` and namespace every key with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::StoreUnavailable`] if the client cannot be
    /// created or the first connection fails.
    pub async fn new(redis_url: &str, prefix: impl Into<String>) -> Result<Self, ReservationError> {
        let client = Client::open(redis_url)
            .map_err(|e| ReservationError::StoreUnavailable(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            ReservationError::StoreUnavailable(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self {
            conn_manager,
            prefix: prefix.into(),
        })
    }

    /// Key prefix applied to every reservation.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

impl IdempotencyStore for RedisIdempotencyStore {
    fn reserve(&self, key: &str, ttl: Duration) -> BoxFuture<'_, Result<bool, ReservationError>> {
        let mut conn = self.conn_manager.clone();
        let full_key = self.full_key(key);
        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        Box::pin(async move {
            let reply: Option<String> = redis::cmd("SET")
                .arg(&full_key)
                .arg("1")
                .arg("NX")
                .arg("PX")
                .arg(ttl_millis)
                .query_async(&mut conn)
                .await
                .map_err(|e| ReservationError::StoreUnavailable(format!("Failed to reserve key: {e}")))?;

            let acquired = reply.is_some();
            tracing::debug!(key = %full_key, acquired, ttl_millis, "Idempotency reservation");
            Ok(acquired)
        })
    }
}
