//! # PulseCart Worker
//!
//! Consumes `OrdersCreated` events, deduplicates them by `order_id` and
//! notifies the notifications service once per order.
//!
//! ```text
//! topic ─► OrdersCreatedConsumer ─► OrdersCreatedProcessor ─┬─► IdempotencyStore
//!                                                           └─► Notifier
//! ```
//!
//! Failures are logged and counted. Nothing is retried.

#![forbid(unsafe_code)]

pub mod config;
pub mod consumer;
pub mod notifier;
pub mod processor;
pub mod server;

pub use config::{Config, NotifierMode};
pub use consumer::{MessageOutcome, OrdersCreatedConsumer};
pub use notifier::{HttpNotifier, LogNotifier};
pub use processor::{OrdersCreatedProcessor, ProcessError};
pub use server::build_metrics_router;
