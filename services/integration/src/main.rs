//! unitrace integration service binary.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;
use unitrace_integration::{
    api, config,
    delivery::{Deliverer, TokioSleeper},
    state::AppState,
};
use unitrace_service::{server, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;
    telemetry::init(&config.log_level);

    info!("Starting unitrace integration service");
    info!(
        listen_addr = %config.listen_addr,
        external_api = %config.external_api,
        max_attempts = config.retry.max_attempts,
        attempt_timeout_secs = config.retry.attempt_timeout.as_secs(),
        "Configuration loaded"
    );

    let deliverer = Deliverer::new(
        config.external_api.clone(),
        config.retry,
        Arc::new(TokioSleeper),
    )?;
    let app = api::create_router(AppState::new(deliverer));

    let (shutdown_tx, _shutdown_rx) = watch::channel(false);
    server::serve(config.listen_addr, app, shutdown_tx).await?;

    info!("Integration service shutdown complete");
    Ok(())
}
