mod api;
mod bootstrap;
mod health;

use std::sync::Arc;

use anyhow::Result;
use deskvoice_core::config::{AppConfig, LoadOptions};
use deskvoice_core::telemetry::init_logging;
use deskvoice_core::ServiceDesk;
use deskvoice_realtime::RealtimeBridge;
use tracing::{error, info};

use crate::api::ApiState;
use crate::bootstrap::Application;

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config.logging);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let Application { config, db_pool, desk, assistant } = app;

    if config.realtime.enabled {
        let backend: Arc<dyn ServiceDesk> = desk.clone();
        let mut bridge = RealtimeBridge::from_config(&config.realtime, backend)?;
        tokio::spawn(async move {
            if let Err(error) = bridge.run().await {
                error!(
                    event_name = "system.realtime.stopped",
                    correlation_id = "bootstrap",
                    error = %error,
                    "realtime bridge terminated"
                );
            }
        });
    }

    let router = health::router(db_pool.clone())
        .merge(api::router(ApiState::new(db_pool.clone(), desk, assistant)))
        .fallback(api::fallback);

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        realtime_enabled = config.realtime.enabled,
        "deskvoice-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "deskvoice-server stopping"
    );
    db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(
            event_name = "system.server.signal_failed",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}
