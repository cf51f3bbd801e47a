//! unitrace aggregation service binary.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use unitrace_aggregation::{
    api, config,
    coordinator::Coordinator,
    migration_dirs,
    state::AppState,
    store::{ContainerStore, MemoryContainerStore, PgContainerStore},
    validator::HttpSerialValidator,
};
use unitrace_db::{Database, StoreBackend};
use unitrace_service::{server, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;
    telemetry::init(&config.log_level);

    info!("Starting unitrace aggregation service");
    info!(
        listen_addr = %config.listen_addr,
        serialization_url = %config.serialization_url,
        store = ?config.store,
        "Configuration loaded"
    );

    let store: Arc<dyn ContainerStore> = match config.store {
        StoreBackend::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => db,
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            if config.dev_mode {
                info!("Running database migrations (dev mode)");
                if let Err(e) = db.run_migrations(&migration_dirs()).await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            Arc::new(PgContainerStore::new(db.pool().clone()))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory container store; records are lost on exit");
            Arc::new(MemoryContainerStore::new())
        }
    };

    let validator =
        HttpSerialValidator::new(config.serialization_url.clone(), config.validation_timeout)?;
    let coordinator = Coordinator::new(store, Arc::new(validator));

    let app = api::create_router(AppState::new(coordinator));

    let (shutdown_tx, _shutdown_rx) = watch::channel(false);
    server::serve(config.listen_addr, app, shutdown_tx).await?;

    info!("Aggregation service shutdown complete");
    Ok(())
}
