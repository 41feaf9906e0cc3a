//! Consumer loop against the in-memory bus.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pulsecart_core::{CONSUMER_KEY_PREFIX, EventBus, ORDERS_CREATED_TOPIC};
use pulsecart_runtime::MetricsRegistry;
use pulsecart_testing::{InMemoryEventBus, InMemoryIdempotencyStore, RecordingNotifier};
use pulsecart_worker::{OrdersCreatedConsumer, OrdersCreatedProcessor};
use std::sync::Arc;
use std::time::Duration;

async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn payload(order_id: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "OrdersCreated",
        "version": 1,
        "order_id": order_id,
        "user_id": "u_1",
        "request_id": "req_1",
        "total_cents": 3000,
        "currency": "USD",
        "created_at": "2025-01-01T00:00:00Z",
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn redelivered_event_notifies_once() {
    let bus = InMemoryEventBus::new();
    let notifier = RecordingNotifier::new();
    let metrics = Arc::new(MetricsRegistry::new("pulsecart_worker"));
    let processor = OrdersCreatedProcessor::new(Arc::clone(&metrics))
        .with_idempotency_store(Arc::new(InMemoryIdempotencyStore::new(CONSUMER_KEY_PREFIX)))
        .with_notifier(Arc::new(notifier.clone()));

    let (mut consumer, shutdown) =
        OrdersCreatedConsumer::new(Arc::new(bus.clone()), ORDERS_CREATED_TOPIC, Arc::new(processor));
    let task = tokio::spawn(async move { consumer.start().await });

    eventually(|| bus.subscriber_count(ORDERS_CREATED_TOPIC) == 1).await;

    bus.publish(ORDERS_CREATED_TOPIC, "ord_1", payload("ord_1")).await.unwrap();
    bus.publish(ORDERS_CREATED_TOPIC, "ord_1", payload("ord_1")).await.unwrap();
    bus.publish(ORDERS_CREATED_TOPIC, "bad", b"{".to_vec()).await.unwrap();
    bus.publish(ORDERS_CREATED_TOPIC, "ord_2", payload("ord_2")).await.unwrap();

    eventually(|| metrics.counter("messages_processed_total") == 2).await;

    assert_eq!(metrics.counter("messages_received_total"), 4);
    assert_eq!(notifier.calls(), 2);
    let notified: Vec<String> = notifier.notified().into_iter().map(|e| e.order_id).collect();
    assert_eq!(notified, vec!["ord_1".to_string(), "ord_2".to_string()]);
    assert_eq!(metrics.counter("messages_duplicates_total"), 1);
    assert_eq!(metrics.counter("decode_errors_total"), 1);

    shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn resubscribes_after_stream_ends() {
    let bus = InMemoryEventBus::new();
    let notifier = RecordingNotifier::new();
    let processor = OrdersCreatedProcessor::new(Arc::new(MetricsRegistry::new("pulsecart_worker")))
        .with_idempotency_store(Arc::new(InMemoryIdempotencyStore::new(CONSUMER_KEY_PREFIX)))
        .with_notifier(Arc::new(notifier.clone()));

    let (consumer, shutdown) =
        OrdersCreatedConsumer::new(Arc::new(bus.clone()), ORDERS_CREATED_TOPIC, Arc::new(processor));
    let mut consumer = consumer.with_resubscribe_delay(Duration::from_millis(20));
    let task = tokio::spawn(async move { consumer.start().await });

    eventually(|| bus.subscriber_count(ORDERS_CREATED_TOPIC) == 1).await;
    bus.close_subscriptions();
    eventually(|| bus.subscriber_count(ORDERS_CREATED_TOPIC) == 1).await;

    bus.publish(ORDERS_CREATED_TOPIC, "ord_1", payload("ord_1")).await.unwrap();
    eventually(|| notifier.calls() == 1).await;

    shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
}
