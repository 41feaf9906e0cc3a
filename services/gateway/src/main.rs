//! Gateway binary.

use pulsecart_gateway::{AppState, Config, OrdersForwarder, build_router};
use pulsecart_runtime::{MetricsRegistry, logging};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    logging::init("pulsecart_gateway=info,tower_http=info", config.server.log_format);

    info!(
        orders_url = %config.upstream.orders_url,
        request_timeout_ms = config.upstream.request_timeout.as_millis(),
        upstream_timeout_ms = config.upstream.upstream_timeout.as_millis(),
        "Starting gateway"
    );

    let metrics = Arc::new(MetricsRegistry::new("pulsecart_gateway"));
    let forwarder = OrdersForwarder::new(&config.upstream, Arc::clone(&metrics))?;
    let app = build_router(AppState {
        forwarder: Arc::new(forwarder),
        metrics,
    });

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Gateway listening");

    pulsecart_web::serve(listener, app, config.server.shutdown_timeout).await?;

    info!("Gateway stopped");
    Ok(())
}
