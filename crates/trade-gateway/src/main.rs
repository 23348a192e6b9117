//! Trade gateway server binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trade_gateway::{router, GatewayConfig};
use trade_relay::Relay;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = GatewayConfig::from_env().context("loading configuration")?;
    info!(
        bind = %config.bind_addr,
        tick_interval = ?config.relay.tick_interval,
        idle_timeout = ?config.idle_timeout,
        "starting trade gateway"
    );

    let relay = Relay::new(config.relay.clone());
    let app = router(relay, Arc::new(config.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("serving")?;

    info!("gateway stopped");
    Ok(())
}
