//! Durable order storage.

use crate::order::OrderItem;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;

/// Input to [`OrderStore::create_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderParams {
    /// Server-generated order ID.
    pub order_id: String,
    /// Customer placing the order.
    pub user_id: String,
    /// ISO currency code.
    pub currency: String,
    /// Validated line items.
    pub items: Vec<OrderItem>,
}

/// An order as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOrder {
    /// Order ID.
    pub order_id: String,
    /// Customer who placed the order.
    pub user_id: String,
    /// Total computed by the store from the items.
    pub total_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// Timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
}

/// Errors from the order store.
#[derive(Error, Debug, Clone)]
pub enum PersistenceError {
    /// The order has no items.
    #[error("Order has no items")]
    NoItems,

    /// The item totals overflow.
    #[error("Order total out of range")]
    TotalOverflow,

    /// The database rejected the write or could not be reached.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Transactional order writer.
///
/// The order header and all its items are written atomically: either every
/// row is visible afterwards or none is.
pub trait OrderStore: Send + Sync {
    /// Persist an order with its items.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if validation of the totals fails or the
    /// transaction does not commit.
    fn create_order(&self, params: CreateOrderParams) -> BoxFuture<'_, Result<PersistedOrder, PersistenceError>>;
}
