//! # PulseCart Testing
//!
//! In-memory doubles for every capability trait in `pulsecart-core`, so the
//! orchestrator and worker can be tested at memory speed with no Redis,
//! Postgres or broker running.
//!
//! | Double | Trait | Inspect with |
//! |--------|-------|--------------|
//! | [`InMemoryIdempotencyStore`] | `IdempotencyStore` | `reserved_keys()` |
//! | [`InMemoryOrderStore`] | `OrderStore` | `calls()`, `orders()` |
//! | [`RecordingPublisher`] | `EventPublisher` | `published()` |
//! | [`RecordingNotifier`] | `Notifier` | `notified()` |
//! | [`InMemoryEventBus`] | `EventBus` | `published()` |
//!
//! Every double can be switched into a failing mode to exercise error paths.
//!
//! ## Example
//!
//! ```
//! use pulsecart_core::idempotency::IdempotencyStore;
//! use pulsecart_testing::InMemoryIdempotencyStore;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryIdempotencyStore::new("orders:idempotency:");
//! assert!(store.reserve("idem-1", Duration::from_secs(60)).await.unwrap());
//! assert!(!store.reserve("idem-1", Duration::from_secs(60)).await.unwrap());
//! # }
//! ```

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap on poisoned locks
#![allow(clippy::missing_panics_doc)]

pub mod event_bus;
pub mod mocks;

pub use event_bus::InMemoryEventBus;
pub use mocks::{
    InMemoryIdempotencyStore, InMemoryOrderStore, RecordingNotifier, RecordingPublisher, test_clock,
};
