//! Redpanda event bus implementation for PulseCart.
//!
//! This crate provides the Kafka-compatible [`EventBus`] used by the orders
//! service to publish `OrdersCreated` payloads and by the worker to consume
//! them. It uses rdkafka and works against Redpanda, Apache Kafka or any other
//! broker speaking the Kafka protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  orders service │
//! │  (persist, then │
//! │   publish)      │
//! └────────┬────────┘
//!          │ key = order_id, payload = JSON
//!          ▼
//! ┌─────────────────┐
//! │    Redpanda     │◄─── orders.created.v1
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     worker      │◄─── consumer group, manual commit
//! └─────────────────┘
//! ```
//!
//! # Delivery Semantics
//!
//! Payloads are opaque bytes. The consumer is polled by the returned stream
//! itself, and a message's offset is committed only when the subscriber asks
//! for the next one. A subscriber that finishes handling a message before
//! polling again therefore gets at-least-once delivery: if the process
//! crashes mid-handling the message is redelivered, so subscribers must be
//! idempotent. New consumer groups start from the earliest offset by default.
//! Messages sharing a key land on the same partition and keep their relative
//! order.
//!
//! # Example
//!
//! ```no_run
//! use pulsecart_redpanda::RedpandaEventBus;
//! use pulsecart_core::event_bus::EventBus;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let event_bus = RedpandaEventBus::new("localhost:9092")?;
//!
//! event_bus.publish("orders.created.v1", "order-1", br#"{"order_id":"order-1"}"#.to_vec()).await?;
//!
//! let mut stream = event_bus.subscribe(&["orders.created.v1"]).await?;
//! while let Some(result) = stream.next().await {
//!     match result {
//!         Ok(message) => println!("Received {:?}", message.key),
//!         Err(e) => eprintln!("Error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use futures::future::BoxFuture;
use pulsecart_core::event_bus::{BusMessage, EventBus, EventBusError, EventStream};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;

/// Default producer send timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default producer acknowledgment mode.
pub const DEFAULT_PRODUCER_ACKS: &str = "all";

/// Default offset policy for consumer groups without a committed offset.
pub const DEFAULT_AUTO_OFFSET_RESET: &str = "earliest";

/// Redpanda event bus implementation.
///
/// - **At-least-once delivery**: Messages may be delivered multiple times
/// - **Ordering within partition**: Messages with the same key keep their order
/// - **Consumer groups**: Multiple worker instances share the workload
///
/// # Example
///
/// ```no_run
/// use pulsecart_redpanda::RedpandaEventBus;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let event_bus = RedpandaEventBus::builder()
///     .brokers("localhost:9092,localhost:9093")
///     .producer_acks("all")
///     .consumer_group("pulsecart-worker")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaEventBus {
    /// Kafka producer for publishing messages
    producer: FutureProducer,
    /// Broker addresses (for creating consumers)
    brokers: String,
    /// Producer timeout
    timeout: Duration,
    /// Consumer group ID (if explicitly set)
    consumer_group: Option<String>,
    /// Auto offset reset policy
    auto_offset_reset: String,
}

impl RedpandaEventBus {
    /// Create a new Redpanda event bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot be
    /// created from the given broker list.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder for configuring the event bus.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// Get a reference to the brokers string.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Consumer group used for subscriptions, if explicitly set.
    #[must_use]
    pub fn consumer_group(&self) -> Option<&str> {
        self.consumer_group.as_deref()
    }

    /// Where new consumer groups start reading.
    #[must_use]
    pub fn auto_offset_reset(&self) -> &str {
        &self.auto_offset_reset
    }

    /// Producer send timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder for configuring a [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    timeout: Option<Duration>,
    consumer_group: Option<String>,
    auto_offset_reset: Option<String>,
}

impl RedpandaEventBusBuilder {
    /// Set the comma-separated broker addresses.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode: `"0"`, `"1"` or `"all"`.
    ///
    /// Default: `"all"`
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the producer send timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the consumer group ID for subscriptions.
    ///
    /// If not set, the group is derived from the subscribed topics. Instances
    /// sharing a group split the partitions between them.
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = Some(consumer_group.into());
        self
    }

    /// Set where new consumer groups start reading: `"earliest"`, `"latest"`
    /// or `"error"`.
    ///
    /// Default: `"earliest"`, so a group joining for the first time reads
    /// messages published before it existed.
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Build the [`RedpandaEventBus`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if brokers are not set or
    /// the producer cannot be created.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self
            .brokers
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| EventBusError::ConnectionFailed("Brokers not configured".to_string()))?;
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let acks = self.producer_acks.as_deref().unwrap_or(DEFAULT_PRODUCER_ACKS);
        let auto_offset_reset = self
            .auto_offset_reset
            .unwrap_or_else(|| DEFAULT_AUTO_OFFSET_RESET.to_string());

        let mut producer_config = ClientConfig::new();
        producer_config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", acks);

        let producer: FutureProducer = producer_config
            .create()
            .map_err(|e| EventBusError::ConnectionFailed(format!("Failed to create producer: {e}")))?;

        tracing::info!(
            brokers = %brokers,
            acks,
            auto_offset_reset = %auto_offset_reset,
            consumer_group = self.consumer_group.as_deref().unwrap_or("<derived>"),
            "RedpandaEventBus created"
        );

        Ok(RedpandaEventBus {
            producer,
            brokers,
            timeout,
            consumer_group: self.consumer_group,
            auto_offset_reset,
        })
    }
}

fn derived_group_id(topics: &[String]) -> String {
    let mut sorted = topics.to_vec();
    sorted.sort();
    format!("pulsecart-{}", sorted.join("-"))
}

impl EventBus for RedpandaEventBus {
    fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> BoxFuture<'_, Result<(), EventBusError>> {
        let topic = topic.to_string();
        let key = key.to_string();
        let timeout = self.timeout;

        Box::pin(async move {
            let record = FutureRecord::to(&topic).payload(&payload).key(&key);

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        key = %key,
                        partition,
                        offset,
                        "Message published"
                    );
                    Ok(())
                },
                Err((kafka_error, _)) => {
                    tracing::error!(topic = %topic, key = %key, error = %kafka_error, "Failed to publish message");
                    Err(EventBusError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                },
            }
        })
    }

    fn subscribe(&self, topics: &[&str]) -> BoxFuture<'_, Result<EventStream, EventBusError>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();
        let brokers = self.brokers.clone();
        let consumer_group = self.consumer_group.clone();
        let auto_offset_reset = self.auto_offset_reset.clone();

        Box::pin(async move {
            let consumer_group_id = consumer_group.unwrap_or_else(|| derived_group_id(&topics));

            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &brokers)
                .set("group.id", &consumer_group_id)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", &auto_offset_reset)
                .set("session.timeout.ms", "6000")
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topics: topics.clone(),
                    reason: format!("Failed to create consumer: {e}"),
                })?;

            let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
            consumer
                .subscribe(&topic_refs)
                .map_err(|e| EventBusError::SubscriptionFailed {
                    topics: topics.clone(),
                    reason: format!("Failed to subscribe to topics: {e}"),
                })?;

            tracing::info!(
                topics = ?topics,
                consumer_group = %consumer_group_id,
                auto_offset_reset = %auto_offset_reset,
                "Subscribed to topics"
            );

            // The stream owns the consumer. A message is committed when the
            // stream is polled again, i.e. after the subscriber handled it.
            let stream = async_stream::stream! {
                use futures::StreamExt;
                use rdkafka::consumer::CommitMode;

                let mut messages = consumer.stream();

                while let Some(msg_result) = messages.next().await {
                    match msg_result {
                        Ok(message) => {
                            tracing::trace!(
                                topic = message.topic(),
                                partition = message.partition(),
                                offset = message.offset(),
                                "Received message"
                            );

                            yield Ok(BusMessage {
                                topic: message.topic().to_string(),
                                key: message.key().map(|k| String::from_utf8_lossy(k).into_owned()),
                                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                            });

                            if let Err(e) = consumer.commit_message(&message, CommitMode::Async) {
                                tracing::warn!(
                                    topic = message.topic(),
                                    partition = message.partition(),
                                    offset = message.offset(),
                                    error = %e,
                                    "Failed to commit offset (message may be redelivered)"
                                );
                            }
                        },
                        Err(e) => {
                            yield Err(EventBusError::TransportError(format!("Failed to receive message: {e}")));
                        },
                    }
                }

                tracing::debug!("Consumer stream ended");
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}
