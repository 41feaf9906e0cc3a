//! Subscription loop feeding `OrdersCreated` messages to the processor.

use crate::processor::OrdersCreatedProcessor;
use futures::StreamExt;
use pulsecart_core::event_bus::{BusMessage, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Delay before resubscribing after the stream ends or subscribing fails.
pub const DEFAULT_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// Outcome of handling one message, for callers that want to observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The notifier ran.
    Processed,
    /// The order was already handled.
    Duplicate,
    /// Processing failed; logged and counted, not retried.
    Failed,
}

/// Consumes a topic until shut down.
///
/// Per-message failures never stop the loop. When the stream ends or the
/// subscription cannot be made, the consumer waits and subscribes again.
///
/// # Example
///
/// ```ignore
/// let (mut consumer, shutdown) = OrdersCreatedConsumer::new(bus, "orders.created.v1", processor);
///
/// tokio::spawn(async move {
///     pulsecart_runtime::shutdown_signal().await;
///     shutdown.send(true).ok();
/// });
///
/// consumer.start().await;
/// ```
pub struct OrdersCreatedConsumer {
    event_bus: Arc<dyn EventBus>,
    topic: String,
    processor: Arc<OrdersCreatedProcessor>,
    resubscribe_delay: Duration,
    shutdown: watch::Receiver<bool>,
}

impl OrdersCreatedConsumer {
    /// Create a consumer and the sender that stops it.
    ///
    /// Send `true` on the returned sender (or drop it) to stop [`start`](Self::start).
    #[must_use]
    pub fn new(
        event_bus: Arc<dyn EventBus>,
        topic: impl Into<String>,
        processor: Arc<OrdersCreatedProcessor>,
    ) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let consumer = Self {
            event_bus,
            topic: topic.into(),
            processor,
            resubscribe_delay: DEFAULT_RESUBSCRIBE_DELAY,
            shutdown: shutdown_rx,
        };

        (consumer, shutdown_tx)
    }

    /// Set the delay before resubscribing.
    #[must_use]
    pub const fn with_resubscribe_delay(mut self, delay: Duration) -> Self {
        self.resubscribe_delay = delay;
        self
    }

    /// Topic being consumed.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Run until shut down.
    pub async fn start(&mut self) {
        tracing::info!(topic = %self.topic, "Starting OrdersCreated consumer");

        while !self.is_shutdown() {
            let subscription = tokio::select! {
                result = self.event_bus.subscribe(&[self.topic.as_str()]) => result,
                () = wait_for_shutdown(&mut self.shutdown) => break,
            };

            match subscription {
                Ok(mut stream) => {
                    tracing::info!(topic = %self.topic, "Subscribed");
                    loop {
                        tokio::select! {
                            next = stream.next() => match next {
                                Some(Ok(message)) => {
                                    self.handle(&message).await;
                                },
                                Some(Err(e)) => {
                                    tracing::error!(topic = %self.topic, error = %e, "Error receiving message");
                                },
                                None => {
                                    tracing::warn!(topic = %self.topic, "Event stream ended");
                                    break;
                                },
                            },
                            () = wait_for_shutdown(&mut self.shutdown) => {
                                tracing::info!(topic = %self.topic, "OrdersCreated consumer stopped");
                                return;
                            },
                        }
                    }
                },
                Err(e) => {
                    tracing::error!(topic = %self.topic, error = %e, "Subscription failed");
                },
            }

            tokio::select! {
                () = tokio::time::sleep(self.resubscribe_delay) => {},
                () = wait_for_shutdown(&mut self.shutdown) => break,
            }
        }

        tracing::info!(topic = %self.topic, "OrdersCreated consumer stopped");
    }

    /// Process one message and log the outcome.
    pub async fn handle(&self, message: &BusMessage) -> MessageOutcome {
        match self.processor.handle_message(&message.payload).await {
            Ok(true) => {
                tracing::info!(topic = %message.topic, key = ?message.key, "Message processed");
                MessageOutcome::Processed
            },
            Ok(false) => {
                tracing::info!(topic = %message.topic, key = ?message.key, "Duplicate event ignored");
                MessageOutcome::Duplicate
            },
            Err(e) => {
                tracing::error!(topic = %message.topic, key = ?message.key, error = %e, "Failed to process message");
                MessageOutcome::Failed
            },
        }
    }

    fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Resolve once `true` is sent or the sender is dropped.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pulsecart_core::CONSUMER_KEY_PREFIX;
    use pulsecart_runtime::MetricsRegistry;
    use pulsecart_testing::{InMemoryEventBus, InMemoryIdempotencyStore, RecordingNotifier};

    fn processor(notifier: &RecordingNotifier) -> Arc<OrdersCreatedProcessor> {
        Arc::new(
            OrdersCreatedProcessor::new(Arc::new(MetricsRegistry::new("test_worker")))
                .with_idempotency_store(Arc::new(InMemoryIdempotencyStore::new(CONSUMER_KEY_PREFIX)))
                .with_notifier(Arc::new(notifier.clone())),
        )
    }

    fn message(payload: &str) -> BusMessage {
        BusMessage {
            topic: "orders.created.v1".to_string(),
            key: Some("ord_1".to_string()),
            payload: payload.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn handle_reports_outcomes() {
        let notifier = RecordingNotifier::new();
        let (consumer, _shutdown) =
            OrdersCreatedConsumer::new(Arc::new(InMemoryEventBus::new()), "orders.created.v1", processor(&notifier));

        let body = r#"{"order_id":"ord_1","user_id":"u_1","total_cents":100,"currency":"USD"}"#;
        assert_eq!(consumer.handle(&message(body)).await, MessageOutcome::Processed);
        assert_eq!(consumer.handle(&message(body)).await, MessageOutcome::Duplicate);
        assert_eq!(consumer.handle(&message("garbage")).await, MessageOutcome::Failed);
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn stops_when_shutdown_sent() {
        let notifier = RecordingNotifier::new();
        let (mut consumer, shutdown) =
            OrdersCreatedConsumer::new(Arc::new(InMemoryEventBus::new()), "orders.created.v1", processor(&notifier));

        let handle = tokio::spawn(async move { consumer.start().await });
        shutdown.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("consumer should stop")
            .unwrap();
    }
}
