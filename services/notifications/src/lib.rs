//! # PulseCart Notifications
//!
//! Receives order-created notifications from the worker, validates them and
//! acknowledges with `202 Accepted`. Delivery to customers is out of scope;
//! accepted notifications are logged.

#![forbid(unsafe_code)]

pub mod config;
pub mod notify;
pub mod server;

pub use config::Config;
pub use notify::{NotifyError, NotifyResponse};
pub use server::build_router;
