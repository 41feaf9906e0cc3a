//! Order creation orchestration.
//!
//! ```text
//! body ─► parse ─► validate ─► require key ─► reserve ─┬─ taken ─► Duplicate
//!                                                      └─ acquired ─► persist ─► publish ─► created
//! ```
//!
//! The reservation is never released. A request that fails after reserving
//! (persistence or publish) burns its key, and a resubmission with the same
//! key is answered as a duplicate.

use pulsecart_core::event::OrdersCreatedEvent;
use pulsecart_core::idempotency::{DEFAULT_IDEMPOTENCY_TTL, IdempotencyStore, ReservationError};
use pulsecart_core::ids::new_order_id;
use pulsecart_core::order::{CreateOrderRequest, CreateOrderResponse, ValidationError};
use pulsecart_core::persistence::{CreateOrderParams, OrderStore, PersistenceError};
use pulsecart_core::publisher::{EventPublisher, PublishError};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_web::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Reasons a create-order call fails.
#[derive(Debug, Error)]
pub enum CreateOrderError {
    /// Body is not a JSON order request.
    #[error("invalid json")]
    InvalidJson(#[source] serde_json::Error),

    /// Body parsed but failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// `Idempotency-Key` header missing or blank.
    #[error("missing Idempotency-Key header")]
    MissingIdempotencyKey,

    /// A collaborator was never wired in.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// Reservation store could not answer.
    #[error("idempotency check failed")]
    IdempotencyCheck(#[source] ReservationError),

    /// Key already reserved by an earlier request.
    #[error("duplicate request")]
    Duplicate,

    /// Transactional write failed.
    #[error("order persistence failed")]
    Persistence(#[source] PersistenceError),

    /// Event could not be emitted.
    #[error("event publish failed")]
    Publish(#[source] PublishError),
}

impl CreateOrderError {
    /// Counter incremented when this error ends a request.
    #[must_use]
    pub const fn metric(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) | Self::Validation(_) | Self::MissingIdempotencyKey => {
                "create_order_validation_errors_total"
            },
            Self::NotConfigured(_) => "create_order_service_errors_total",
            Self::IdempotencyCheck(_) => "create_order_idempotency_errors_total",
            Self::Duplicate => "create_order_duplicates_total",
            Self::Persistence(_) => "create_order_persistence_errors_total",
            Self::Publish(_) => "create_order_publish_errors_total",
        }
    }
}

impl From<CreateOrderError> for AppError {
    fn from(err: CreateOrderError) -> Self {
        match err {
            CreateOrderError::Validation(
                ValidationError::MissingUserId | ValidationError::MissingCurrency | ValidationError::NoItems,
            ) => Self::bad_request("missing fields"),
            CreateOrderError::InvalidJson(_)
            | CreateOrderError::Validation(_)
            | CreateOrderError::MissingIdempotencyKey => Self::bad_request(err.to_string()),
            CreateOrderError::Duplicate => Self::conflict(err.to_string()),
            CreateOrderError::NotConfigured(_) => Self::unavailable(err.to_string()),
            CreateOrderError::IdempotencyCheck(_)
            | CreateOrderError::Persistence(_)
            | CreateOrderError::Publish(_) => {
                let message = err.to_string();
                Self::unavailable(message).with_source(anyhow::Error::new(err))
            },
        }
    }
}

/// Wires the reservation store, order store and publisher together.
///
/// Collaborators are optional so a partially configured service still answers
/// with 503 instead of failing to start.
#[derive(Clone)]
pub struct OrderService {
    idempotency: Option<Arc<dyn IdempotencyStore>>,
    orders: Option<Arc<dyn OrderStore>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    metrics: Arc<MetricsRegistry>,
    idempotency_ttl: Duration,
}

impl OrderService {
    /// Service with no collaborators and the default reservation TTL.
    #[must_use]
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            idempotency: None,
            orders: None,
            publisher: None,
            metrics,
            idempotency_ttl: DEFAULT_IDEMPOTENCY_TTL,
        }
    }

    /// Set the reservation store.
    #[must_use]
    pub fn with_idempotency_store(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.idempotency = Some(store);
        self
    }

    /// Set the order store.
    #[must_use]
    pub fn with_order_store(mut self, store: Arc<dyn OrderStore>) -> Self {
        self.orders = Some(store);
        self
    }

    /// Set the event publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Set how long idempotency keys stay reserved.
    #[must_use]
    pub const fn with_idempotency_ttl(mut self, ttl: Duration) -> Self {
        self.idempotency_ttl = ttl;
        self
    }

    /// Registry the service records into.
    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Create an order from a raw request body.
    ///
    /// Records the request, outcome and duration metrics.
    ///
    /// # Errors
    ///
    /// See [`CreateOrderError`] for every failure and the order they are
    /// checked in.
    pub async fn create_order(
        &self,
        body: &[u8],
        idempotency_key: Option<&str>,
        request_id: &str,
    ) -> Result<CreateOrderResponse, CreateOrderError> {
        let start = Instant::now();
        self.metrics.inc("create_order_requests_total");

        let result = self.run(body, idempotency_key, request_id).await;

        match &result {
            Ok(response) => {
                self.metrics.inc("create_order_success_total");
                tracing::info!(order_id = %response.order_id, "Order created");
            },
            Err(CreateOrderError::Duplicate) => {
                self.metrics.inc(CreateOrderError::Duplicate.metric());
                tracing::info!(idempotency_key = ?idempotency_key, "Duplicate request rejected");
            },
            Err(e) => {
                self.metrics.inc(e.metric());
                tracing::debug!(error = %e, "Create order failed");
            },
        }
        self.metrics.observe_duration("create_order_duration", start.elapsed());

        result
    }

    async fn run(
        &self,
        body: &[u8],
        idempotency_key: Option<&str>,
        request_id: &str,
    ) -> Result<CreateOrderResponse, CreateOrderError> {
        let request: CreateOrderRequest = serde_json::from_slice(body).map_err(CreateOrderError::InvalidJson)?;
        let order = request.validate()?;

        let key = idempotency_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(CreateOrderError::MissingIdempotencyKey)?;

        let idempotency = self
            .idempotency
            .as_ref()
            .ok_or(CreateOrderError::NotConfigured("idempotency store"))?;
        let orders = self.orders.as_ref().ok_or(CreateOrderError::NotConfigured("order store"))?;
        let publisher = self
            .publisher
            .as_ref()
            .ok_or(CreateOrderError::NotConfigured("event publisher"))?;

        let acquired = idempotency
            .reserve(key, self.idempotency_ttl)
            .await
            .map_err(CreateOrderError::IdempotencyCheck)?;
        if !acquired {
            return Err(CreateOrderError::Duplicate);
        }

        let persisted = orders
            .create_order(CreateOrderParams {
                order_id: new_order_id(),
                user_id: order.user_id,
                currency: order.currency,
                items: order.items,
            })
            .await
            .map_err(CreateOrderError::Persistence)?;

        let event = OrdersCreatedEvent::from_persisted(&persisted, request_id.trim());
        publisher
            .publish_orders_created(&event)
            .await
            .map_err(CreateOrderError::Publish)?;

        Ok(CreateOrderResponse::created(persisted.order_id))
    }
}
