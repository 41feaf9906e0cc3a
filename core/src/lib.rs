//! # PulseCart Core
//!
//! Domain types and capability traits shared by every PulseCart service.
//!
//! The order pipeline is built from a handful of narrow collaborators, each
//! modelled as a trait with a production implementation in its own crate and
//! an in-memory double in `pulsecart-testing`:
//!
//! | Trait | Production | Purpose |
//! |-------|------------|---------|
//! | [`IdempotencyStore`] | `pulsecart-redis` | Atomic reserve-once-per-key |
//! | [`OrderStore`] | `pulsecart-postgres` | Transactional order write |
//! | [`EventBus`] | `pulsecart-redpanda` | Topic publish/subscribe |
//! | [`EventPublisher`] | `BusEventPublisher` (orders service) | Emit `OrdersCreated` |
//! | [`Notifier`] | `HttpNotifier` (worker service) | Downstream notification |
//!
//! # Flow
//!
//! ```text
//! client ─► gateway ─► orders ─┬─► IdempotencyStore (orders:idempotency:)
//!                              ├─► OrderStore
//!                              └─► EventPublisher ─► topic
//!                                                      │
//!                       worker ◄───────────────────────┘
//!                         ├─► IdempotencyStore (worker:orders-created:)
//!                         └─► Notifier ─► notifications
//! ```

#![forbid(unsafe_code)]

pub mod event;
pub mod event_bus;
pub mod idempotency;
pub mod ids;
pub mod notifier;
pub mod order;
pub mod persistence;
pub mod publisher;

pub use event::{ORDERS_CREATED_EVENT_TYPE, ORDERS_CREATED_TOPIC, ORDERS_CREATED_VERSION, OrdersCreatedEvent};
pub use event_bus::{BusMessage, EventBus, EventBusError, EventStream};
pub use idempotency::{
    CONSUMER_KEY_PREFIX, DEFAULT_IDEMPOTENCY_TTL, IdempotencyStore, PRODUCER_KEY_PREFIX,
    ReservationError,
};
pub use notifier::{Notifier, NotifierError};
pub use order::{
    CreateOrderRequest, CreateOrderResponse, OrderItem, RawOrderItem, ValidatedOrder,
    ValidationError, compute_total_cents,
};
pub use persistence::{CreateOrderParams, OrderStore, PersistedOrder, PersistenceError};
pub use publisher::{EventPublisher, PublishError};
