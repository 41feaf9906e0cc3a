//! Worker binary.

use pulsecart_core::{CONSUMER_KEY_PREFIX, Notifier};
use pulsecart_redis::RedisIdempotencyStore;
use pulsecart_redpanda::RedpandaEventBus;
use pulsecart_runtime::{MetricsRegistry, logging};
use pulsecart_worker::{
    Config, HttpNotifier, LogNotifier, NotifierMode, OrdersCreatedConsumer, OrdersCreatedProcessor,
    build_metrics_router,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    logging::init("pulsecart_worker=info", config.server.log_format);

    info!(
        brokers = %config.brokers,
        topic = %config.topic,
        consumer_group = %config.consumer_group,
        auto_offset_reset = %config.auto_offset_reset,
        notifier = ?config.notifier_mode,
        "Starting worker"
    );

    let metrics = Arc::new(MetricsRegistry::new("pulsecart_worker"));

    let idempotency = RedisIdempotencyStore::new(&config.redis_url, CONSUMER_KEY_PREFIX).await?;
    info!("Idempotency store connected");

    let notifier: Arc<dyn Notifier> = match config.notifier_mode {
        NotifierMode::Http => Arc::new(HttpNotifier::new(&config.notifications_url, config.notifier_timeout)?),
        NotifierMode::Log => Arc::new(LogNotifier),
    };

    let processor = OrdersCreatedProcessor::new(Arc::clone(&metrics))
        .with_idempotency_store(Arc::new(idempotency))
        .with_notifier(notifier)
        .with_idempotency_ttl(config.idempotency_ttl);

    let event_bus = RedpandaEventBus::builder()
        .brokers(&config.brokers)
        .consumer_group(&config.consumer_group)
        .auto_offset_reset(&config.auto_offset_reset)
        .build()?;

    let (mut consumer, shutdown) = OrdersCreatedConsumer::new(Arc::new(event_bus), &config.topic, Arc::new(processor));
    let consumer_task = tokio::spawn(async move { consumer.start().await });

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Worker metrics listening");

    let mut stop = shutdown.subscribe();
    let server_shutdown = async move {
        let _ = stop.wait_for(|stop| *stop).await;
    };
    let server_task = tokio::spawn(pulsecart_web::serve_until(
        listener,
        build_metrics_router(metrics),
        server_shutdown,
        config.server.shutdown_timeout,
    ));

    pulsecart_runtime::shutdown_signal().await;
    let _ = shutdown.send(true);

    if tokio::time::timeout(config.server.shutdown_timeout, consumer_task).await.is_err() {
        error!("Worker shutdown timed out");
    }
    match server_task.await {
        Ok(Err(e)) => error!(error = %e, "Worker metrics server failed"),
        Err(e) => error!(error = %e, "Worker metrics task panicked"),
        Ok(Ok(())) => {},
    }

    info!("Worker shutdown complete");
    Ok(())
}
