//! [`EventPublisher`] backed by an [`EventBus`].

use futures::future::BoxFuture;
use pulsecart_core::event::OrdersCreatedEvent;
use pulsecart_core::event_bus::EventBus;
use pulsecart_core::publisher::{EventPublisher, PublishError};
use std::sync::Arc;

/// Publishes `OrdersCreated` as JSON, keyed by `order_id` so every event for
/// an order lands on the same partition.
#[derive(Clone)]
pub struct BusEventPublisher {
    bus: Arc<dyn EventBus>,
    topic: String,
}

impl BusEventPublisher {
    /// Publish to `topic` on `bus`.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl EventPublisher for BusEventPublisher {
    fn publish_orders_created<'a>(&'a self, event: &'a OrdersCreatedEvent) -> BoxFuture<'a, Result<(), PublishError>> {
        Box::pin(async move {
            let payload = event.encode().map_err(|e| PublishError::Encode(e.to_string()))?;

            self.bus
                .publish(&self.topic, &event.order_id, payload)
                .await
                .map_err(|e| PublishError::Broker(e.to_string()))?;

            tracing::debug!(topic = %self.topic, order_id = %event.order_id, "Published OrdersCreated");
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pulsecart_core::ORDERS_CREATED_TOPIC;
    use pulsecart_core::persistence::PersistedOrder;
    use pulsecart_testing::{InMemoryEventBus, test_clock};

    fn event() -> OrdersCreatedEvent {
        let order = PersistedOrder {
            order_id: "ord_1".to_string(),
            user_id: "u_1".to_string(),
            total_cents: 500,
            currency: "USD".to_string(),
            created_at: test_clock(),
        };
        OrdersCreatedEvent::from_persisted(&order, "req_1")
    }

    #[tokio::test]
    async fn publishes_json_keyed_by_order_id() {
        let bus = InMemoryEventBus::new();
        let publisher = BusEventPublisher::new(Arc::new(bus.clone()), ORDERS_CREATED_TOPIC);

        publisher.publish_orders_created(&event()).await.unwrap();

        let published = bus.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "orders.created.v1");
        assert_eq!(published[0].key.as_deref(), Some("ord_1"));
        assert_eq!(OrdersCreatedEvent::decode(&published[0].payload).unwrap(), event());
    }

    #[tokio::test]
    async fn broker_failure_is_reported() {
        let bus = InMemoryEventBus::new();
        bus.fail_publish(true);
        let publisher = BusEventPublisher::new(Arc::new(bus), ORDERS_CREATED_TOPIC);

        let err = publisher.publish_orders_created(&event()).await.unwrap_err();
        assert!(matches!(err, PublishError::Broker(_)));
    }
}
