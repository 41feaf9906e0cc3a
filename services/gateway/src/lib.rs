//! # PulseCart Gateway
//!
//! Edge proxy in front of the orders service. Assigns a request ID, forwards
//! `POST /v1/orders` with a small header allow-list, and translates transport
//! failures into 502 and 504.

#![forbid(unsafe_code)]

pub mod config;
pub mod forwarder;
pub mod middleware;
pub mod server;

pub use config::{Config, UpstreamConfig};
pub use forwarder::{ForwardError, OrdersForwarder, UpstreamResponse};
pub use server::{AppState, build_router};
