//! Notifications service binary.

use pulsecart_notifications::{Config, build_router};
use pulsecart_runtime::{MetricsRegistry, logging};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    logging::init("pulsecart_notifications=info,tower_http=info", config.server.log_format);

    let metrics = Arc::new(MetricsRegistry::new("pulsecart_notifications"));
    let app = build_router(metrics);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Notifications service listening");

    pulsecart_web::serve(listener, app, config.server.shutdown_timeout).await?;

    info!("Notifications service stopped");
    Ok(())
}
