//! Doubles for the reservation store, order store, publisher and notifier.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use pulsecart_core::event::OrdersCreatedEvent;
use pulsecart_core::idempotency::{IdempotencyStore, ReservationError};
use pulsecart_core::notifier::{Notifier, NotifierError};
use pulsecart_core::order::compute_total_cents;
use pulsecart_core::persistence::{CreateOrderParams, OrderStore, PersistedOrder, PersistenceError};
use pulsecart_core::publisher::{EventPublisher, PublishError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Fixed timestamp used by [`InMemoryOrderStore`] (2025-01-01 00:00:00 UTC).
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .expect("hardcoded timestamp should always parse")
        .with_timezone(&Utc)
}

/// Reservation store backed by a `HashMap` with per-key expiry.
///
/// Expiry uses `tokio::time::Instant`, so tests running with paused time can
/// advance past a TTL deterministically.
#[derive(Clone, Debug)]
pub struct InMemoryIdempotencyStore {
    prefix: String,
    entries: Arc<Mutex<HashMap<String, Instant>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryIdempotencyStore {
    /// Create an empty store namespacing keys with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: Arc::new(Mutex::new(HashMap::new())),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every later `reserve` fail with `StoreUnavailable` (or stop failing).
    pub fn fail_with_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Full keys (prefix included) currently held, sorted.
    #[must_use]
    pub fn reserved_keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, expires_at)| **expires_at > now)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl IdempotencyStore for InMemoryIdempotencyStore {
    fn reserve(&self, key: &str, ttl: Duration) -> BoxFuture<'_, Result<bool, ReservationError>> {
        let full_key = format!("{}{key}", self.prefix);

        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ReservationError::StoreUnavailable("injected failure".to_string()));
            }

            let now = Instant::now();
            let mut entries = self.entries.lock().unwrap();
            match entries.get(&full_key) {
                Some(expires_at) if *expires_at > now => Ok(false),
                _ => {
                    entries.insert(full_key, now + ttl);
                    Ok(true)
                },
            }
        })
    }
}

/// Order store that keeps orders in memory and counts calls.
#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<Mutex<Vec<PersistedOrder>>>,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `create_order` fail (or stop failing).
    pub fn fail_with_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of `create_order` calls, including failed ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Orders successfully stored, in insertion order.
    #[must_use]
    pub fn orders(&self) -> Vec<PersistedOrder> {
        self.orders.lock().unwrap().clone()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn create_order(&self, params: CreateOrderParams) -> BoxFuture<'_, Result<PersistedOrder, PersistenceError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistenceError::DatabaseError("injected failure".to_string()));
            }
            if params.items.is_empty() {
                return Err(PersistenceError::NoItems);
            }
            let total_cents = compute_total_cents(&params.items).ok_or(PersistenceError::TotalOverflow)?;

            let order = PersistedOrder {
                order_id: params.order_id,
                user_id: params.user_id,
                total_cents,
                currency: params.currency,
                created_at: test_clock(),
            };
            self.orders.lock().unwrap().push(order.clone());
            Ok(order)
        })
    }
}

/// Publisher that records every event it is asked to publish.
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<OrdersCreatedEvent>>>,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl RecordingPublisher {
    /// Create an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later publish fail (or stop failing).
    pub fn fail_with_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of publish calls, including failed ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Events successfully published.
    #[must_use]
    pub fn published(&self) -> Vec<OrdersCreatedEvent> {
        self.published.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish_orders_created<'a>(&'a self, event: &'a OrdersCreatedEvent) -> BoxFuture<'a, Result<(), PublishError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PublishError::Broker("injected failure".to_string()));
            }
            self.published.lock().unwrap().push(event.clone());
            Ok(())
        })
    }
}

/// Notifier that records every event it is asked to deliver.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    notified: Arc<Mutex<Vec<OrdersCreatedEvent>>>,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later notification fail (or stop failing).
    pub fn fail_with_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of notify calls, including failed ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Events successfully delivered.
    #[must_use]
    pub fn notified(&self) -> Vec<OrdersCreatedEvent> {
        self.notified.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_order_created<'a>(&'a self, event: &'a OrdersCreatedEvent) -> BoxFuture<'a, Result<(), NotifierError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotifierError::UnexpectedStatus(500));
            }
            self.notified.lock().unwrap().push(event.clone());
            Ok(())
        })
    }
}
