//! # PulseCart Orders
//!
//! HTTP front of the order pipeline. `POST /v1/orders` validates the request,
//! reserves its `Idempotency-Key`, stores the order and emits `OrdersCreated`.
//!
//! ```text
//! ┌──────────────┐   reserve    ┌───────────┐
//! │              │ ───────────► │   Redis   │
//! │ OrderService │   persist    ├───────────┤
//! │              │ ───────────► │ Postgres  │
//! │              │   publish    ├───────────┤
//! │              │ ───────────► │ Redpanda  │
//! └──────────────┘              └───────────┘
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod publisher;
pub mod server;
pub mod service;

pub use config::Config;
pub use publisher::BusEventPublisher;
pub use server::{AppState, build_router};
pub use service::{CreateOrderError, OrderService};
