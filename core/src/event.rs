//! The `OrdersCreated` integration event.
//!
//! Emitted by the orders service after an order is durably stored, consumed by
//! the worker. Serialized as JSON on the wire:
//!
//! ```json
//! {
//!   "type": "OrdersCreated",
//!   "version": 1,
//!   "order_id": "9f2c...",
//!   "user_id": "u_123",
//!   "request_id": "a1b2...",
//!   "total_cents": 1999,
//!   "currency": "USD",
//!   "created_at": "2025-01-01T00:00:00Z"
//! }
//! ```
//!
//! Decoding is lenient: missing fields fall back to their defaults and
//! unknown fields are ignored. Consumers decide which fields they require.

use crate::persistence::PersistedOrder;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

/// Topic carrying [`OrdersCreatedEvent`] payloads.
pub const ORDERS_CREATED_TOPIC: &str = "orders.created.v1";

/// Value of the `type` field.
pub const ORDERS_CREATED_EVENT_TYPE: &str = "OrdersCreated";

/// Current schema version.
pub const ORDERS_CREATED_VERSION: u32 = 1;

/// Announcement that an order has been persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersCreatedEvent {
    /// Always [`ORDERS_CREATED_EVENT_TYPE`] when produced by this crate.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Schema version.
    pub version: u32,
    /// Order the event is about; also the dedup key downstream.
    pub order_id: String,
    /// Customer who placed the order.
    pub user_id: String,
    /// Request ID of the originating HTTP call.
    pub request_id: String,
    /// Order total in minor currency units.
    pub total_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// RFC 3339 UTC timestamp of the persisted order.
    pub created_at: String,
}

impl OrdersCreatedEvent {
    /// Build the event for a freshly persisted order.
    #[must_use]
    pub fn from_persisted(order: &PersistedOrder, request_id: impl Into<String>) -> Self {
        Self {
            event_type: ORDERS_CREATED_EVENT_TYPE.to_string(),
            version: ORDERS_CREATED_VERSION,
            order_id: order.order_id.clone(),
            user_id: order.user_id.clone(),
            request_id: request_id.into(),
            total_cents: order.total_cents,
            currency: order.currency.clone(),
            created_at: order.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Decode an event from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the payload is not a
    /// JSON object with compatible field types.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Encode the event to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
