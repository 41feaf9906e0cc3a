//! Per-message handling of `OrdersCreated`.
//!
//! The consumer key for an order is reserved before the notifier runs, so a
//! notification that fails is not attempted again on redelivery.

use pulsecart_core::event::OrdersCreatedEvent;
use pulsecart_core::idempotency::{DEFAULT_IDEMPOTENCY_TTL, IdempotencyStore, ReservationError};
use pulsecart_core::notifier::{Notifier, NotifierError};
use pulsecart_runtime::MetricsRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Reasons a message could not be handled.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Payload is not an `OrdersCreated` JSON document.
    #[error("decode OrdersCreated: {0}")]
    Decode(#[from] serde_json::Error),

    /// Event has no `order_id` to deduplicate on.
    #[error("missing order_id")]
    MissingOrderId,

    /// A collaborator was never wired in.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// Reservation store could not answer.
    #[error(transparent)]
    IdempotencyCheck(#[from] ReservationError),

    /// Downstream notification failed.
    #[error(transparent)]
    Notifier(#[from] NotifierError),
}

/// Deduplicates events by `order_id` and forwards them to a [`Notifier`].
#[derive(Clone)]
pub struct OrdersCreatedProcessor {
    idempotency: Option<Arc<dyn IdempotencyStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    metrics: Arc<MetricsRegistry>,
    idempotency_ttl: Duration,
}

impl OrdersCreatedProcessor {
    /// Processor with no collaborators and the default reservation TTL.
    #[must_use]
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            idempotency: None,
            notifier: None,
            metrics,
            idempotency_ttl: DEFAULT_IDEMPOTENCY_TTL,
        }
    }

    /// Set the reservation store. It should use the consumer key prefix.
    #[must_use]
    pub fn with_idempotency_store(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.idempotency = Some(store);
        self
    }

    /// Set the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set how long a processed `order_id` stays reserved.
    #[must_use]
    pub const fn with_idempotency_ttl(mut self, ttl: Duration) -> Self {
        self.idempotency_ttl = ttl;
        self
    }

    /// Registry the processor records into.
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Decode and process one raw message.
    ///
    /// Returns `Ok(true)` when the notifier ran, `Ok(false)` for a duplicate
    /// delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Decode`] for an undecodable payload, otherwise
    /// whatever [`process`](Self::process) returns.
    pub async fn handle_message(&self, payload: &[u8]) -> Result<bool, ProcessError> {
        let event = match OrdersCreatedEvent::decode(payload) {
            Ok(event) => event,
            Err(e) => {
                self.metrics.inc("messages_received_total");
                self.metrics.inc("messages_errors_total");
                self.metrics.inc("decode_errors_total");
                return Err(ProcessError::Decode(e));
            },
        };

        self.process(&event).await
    }

    /// Process an already decoded event.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::MissingOrderId`] when `order_id` is blank
    /// - [`ProcessError::NotConfigured`] when a collaborator is missing
    /// - [`ProcessError::IdempotencyCheck`] when the store cannot answer
    /// - [`ProcessError::Notifier`] when delivery fails
    pub async fn process(&self, event: &OrdersCreatedEvent) -> Result<bool, ProcessError> {
        let start = Instant::now();
        self.metrics.inc("messages_received_total");

        let result = self.run(event).await;

        match &result {
            Ok(true) => self.metrics.inc("messages_processed_total"),
            Ok(false) => self.metrics.inc("messages_duplicates_total"),
            Err(e) => {
                self.metrics.inc("messages_errors_total");
                match e {
                    ProcessError::IdempotencyCheck(_) => self.metrics.inc("idempotency_errors_total"),
                    ProcessError::Notifier(_) => self.metrics.inc("notifier_errors_total"),
                    _ => {},
                }
            },
        }
        self.metrics
            .observe_duration("process_orders_created_duration", start.elapsed());

        result
    }

    async fn run(&self, event: &OrdersCreatedEvent) -> Result<bool, ProcessError> {
        let order_id = event.order_id.trim();
        if order_id.is_empty() {
            return Err(ProcessError::MissingOrderId);
        }

        let idempotency = self
            .idempotency
            .as_ref()
            .ok_or(ProcessError::NotConfigured("idempotency store"))?;
        let notifier = self.notifier.as_ref().ok_or(ProcessError::NotConfigured("notifier"))?;

        if !idempotency.reserve(order_id, self.idempotency_ttl).await? {
            return Ok(false);
        }

        notifier.notify_order_created(event).await?;
        Ok(true)
    }
}
