//! Downstream notification of created orders.

use crate::event::OrdersCreatedEvent;
use futures::future::BoxFuture;
use thiserror::Error;

/// Errors raised while notifying.
#[derive(Error, Debug, Clone)]
pub enum NotifierError {
    /// The request could not be built or sent, or timed out.
    #[error("Notification request failed: {0}")]
    Transport(String),

    /// The downstream service answered with something other than 202.
    #[error("Unexpected notification status: {0}")]
    UnexpectedStatus(u16),
}

/// Delivers a notification for a created order.
pub trait Notifier: Send + Sync {
    /// Notify that `event`'s order was created.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] if delivery was not acknowledged.
    fn notify_order_created<'a>(&'a self, event: &'a OrdersCreatedEvent) -> BoxFuture<'a, Result<(), NotifierError>>;
}
