//! Reserve-once semantics for idempotency keys.
//!
//! A reservation is an atomic set-if-absent with a TTL. The first caller to
//! reserve a key wins; every later caller sees `false` until the TTL expires.
//! Reservations are never released on downstream failure, so a retry with the
//! same key after a failed attempt is treated as a duplicate.

use futures::future::BoxFuture;
use std::time::Duration;
use thiserror::Error;

/// Key namespace used by the orders service for `Idempotency-Key` headers.
pub const PRODUCER_KEY_PREFIX: &str = "orders:idempotency:";

/// Key namespace used by the worker for consumed `order_id`s.
pub const CONSUMER_KEY_PREFIX: &str = "worker:orders-created:";

/// Default reservation lifetime.
pub const DEFAULT_IDEMPOTENCY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors from the backing store.
#[derive(Error, Debug, Clone)]
pub enum ReservationError {
    /// The store could not be reached or rejected the command.
    #[error("Idempotency store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Atomic reserve-once store.
pub trait IdempotencyStore: Send + Sync {
    /// Try to reserve `key` for `ttl`.
    ///
    /// Implementations prepend their configured namespace to `key`. Returns
    /// `true` if this call acquired the reservation and `false` if the key
    /// was already held.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::StoreUnavailable`] if the store cannot
    /// answer. Callers must not treat that as either outcome.
    fn reserve(&self, key: &str, ttl: Duration) -> BoxFuture<'_, Result<bool, ReservationError>>;
}
