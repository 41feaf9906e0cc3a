//! Event bus abstraction for topic-based publish/subscribe.
//!
//! The orders service publishes `OrdersCreated` payloads to a topic and the
//! worker consumes them. Both talk to the broker through the [`EventBus`] trait
//! so that tests can swap in an in-memory bus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  1. Persist     │
//! │  order (SQL)    │◄─── Source of truth
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ 2. Publish to   │
//! │    Event Bus    │◄─── At-least-once delivery
//! └────────┬────────┘
//!          │
//!          ▼
//!     ┌─────────┐
//!     │ Worker  │◄─── Deduplicates by order_id
//!     └─────────┘
//! ```
//!
//! # Key Principles
//!
//! - **Persist first**: Orders are written before the event is published
//! - **At-least-once delivery**: Messages may be delivered multiple times
//! - **Idempotency**: Subscribers must handle duplicate messages
//! - **Ordered within partition**: Messages sharing a key keep their order
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use pulsecart_core::event_bus::EventBus;
//!
//! async fn example(bus: impl EventBus) -> Result<(), Box<dyn std::error::Error>> {
//!     bus.publish("orders.created.v1", "order-123", b"{}".to_vec()).await?;
//!
//!     let mut stream = bus.subscribe(&["orders.created.v1"]).await?;
//!     while let Some(result) = stream.next().await {
//!         match result {
//!             Ok(message) => println!("Received {} bytes", message.payload.len()),
//!             Err(e) => eprintln!("Error: {e}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use futures::Stream;
use futures::future::BoxFuture;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish a message to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// Consumer group error
    #[error("Consumer group error: {0}")]
    ConsumerGroupError(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// A message received from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Topic the message was read from.
    pub topic: String,
    /// Partition key, if the producer set one.
    pub key: Option<String>,
    /// Raw message body.
    pub payload: Vec<u8>,
}

/// Stream of messages from subscriptions.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<BusMessage, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// Messages are published to topics with an optional partition key and
/// delivered to subscribers with at-least-once semantics.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the bus can be shared as
/// `Arc<dyn EventBus>`.
pub trait EventBus: Send + Sync {
    /// Publish `payload` to `topic`, partitioned by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the broker does not
    /// acknowledge the message.
    fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), EventBusError>>;

    /// Subscribe to one or more topics and receive a stream of messages.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established.
    fn subscribe(&self, topics: &[&str]) -> BoxFuture<'_, Result<EventStream, EventBusError>>;
}
