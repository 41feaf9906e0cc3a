//! Orders service binary.

use pulsecart_core::PRODUCER_KEY_PREFIX;
use pulsecart_orders::{AppState, BusEventPublisher, Config, OrderService, build_router};
use pulsecart_postgres::PostgresOrderStore;
use pulsecart_redis::RedisIdempotencyStore;
use pulsecart_redpanda::RedpandaEventBus;
use pulsecart_runtime::{MetricsRegistry, logging};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    logging::init("pulsecart_orders=info,tower_http=info", config.server.log_format);

    info!(
        addr = %config.server.bind_addr(),
        brokers = %config.redpanda.brokers,
        topic = %config.redpanda.orders_created_topic,
        "Starting orders service"
    );

    info!("Connecting to order database...");
    let order_store = PostgresOrderStore::connect(&config.postgres.url, config.postgres.max_connections).await?;
    order_store.migrate().await?;
    info!("Order database ready");

    let idempotency = RedisIdempotencyStore::new(&config.redis_url, PRODUCER_KEY_PREFIX).await?;
    info!("Idempotency store connected");

    let event_bus = RedpandaEventBus::builder()
        .brokers(&config.redpanda.brokers)
        .producer_acks(&config.redpanda.producer_acks)
        .timeout(config.redpanda.publish_timeout)
        .build()?;
    let publisher = BusEventPublisher::new(Arc::new(event_bus), &config.redpanda.orders_created_topic);

    let metrics = Arc::new(MetricsRegistry::new("pulsecart_orders"));
    let service = OrderService::new(metrics)
        .with_idempotency_store(Arc::new(idempotency))
        .with_order_store(Arc::new(order_store))
        .with_publisher(Arc::new(publisher))
        .with_idempotency_ttl(config.idempotency_ttl);

    let app = build_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Orders service listening");

    pulsecart_web::serve(listener, app, config.server.shutdown_timeout).await?;

    info!("Orders service stopped");
    Ok(())
}
