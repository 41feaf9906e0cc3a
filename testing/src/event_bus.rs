//! In-memory [`EventBus`] for tests.
//!
//! Publishing delivers synchronously to every live subscription of the topic
//! and appends to a log that tests can inspect. There are no consumer groups:
//! each subscription sees every message published after it was created.

use futures::future::BoxFuture;
use pulsecart_core::event_bus::{BusMessage, EventBus, EventBusError, EventStream};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Subscribers = HashMap<String, Vec<mpsc::UnboundedSender<Result<BusMessage, EventBusError>>>>;

/// Event bus that lives entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventBus {
    subscribers: Arc<Mutex<Subscribers>>,
    published: Arc<Mutex<Vec<BusMessage>>>,
    fail_publish: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later publish fail (or stop failing).
    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Every successfully published message, in order.
    #[must_use]
    pub fn published(&self) -> Vec<BusMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Number of live subscriptions to `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .get(topic)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// Close every subscription stream.
    pub fn close_subscriptions(&self) {
        self.subscribers.lock().unwrap().clear();
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), EventBusError>> {
        let message = BusMessage {
            topic: topic.to_string(),
            key: Some(key.to_string()),
            payload,
        };

        Box::pin(async move {
            if self.fail_publish.load(Ordering::SeqCst) {
                return Err(EventBusError::PublishFailed {
                    topic: message.topic,
                    reason: "injected failure".to_string(),
                });
            }

            if let Some(senders) = self.subscribers.lock().unwrap().get_mut(&message.topic) {
                senders.retain(|tx| tx.send(Ok(message.clone())).is_ok());
            }
            self.published.lock().unwrap().push(message);
            Ok(())
        })
    }

    fn subscribe(&self, topics: &[&str]) -> BoxFuture<'_, Result<EventStream, EventBusError>> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            for topic in topics {
                subscribers.entry((*topic).to_string()).or_default().push(tx.clone());
            }
        }

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        Box::pin(async move { Ok(Box::pin(stream) as EventStream) })
    }
}
