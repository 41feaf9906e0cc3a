//! Outbound event emission.

use crate::event::OrdersCreatedEvent;
use futures::future::BoxFuture;
use thiserror::Error;

/// Errors raised while publishing an event.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// The event could not be encoded.
    #[error("Failed to encode event: {0}")]
    Encode(String),

    /// The broker did not accept the event.
    #[error("Failed to publish event: {0}")]
    Broker(String),
}

/// Publishes `OrdersCreated` events.
pub trait EventPublisher: Send + Sync {
    /// Publish `event`, keyed by its order ID.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the event cannot be encoded or sent.
    fn publish_orders_created<'a>(&'a self, event: &'a OrdersCreatedEvent) -> BoxFuture<'a, Result<(), PublishError>>;
}
