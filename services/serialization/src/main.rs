//! unitrace serialization service binary.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use unitrace_db::{Database, StoreBackend};
use unitrace_serialization::{
    allocator::Allocator,
    api, config, migration_dirs,
    state::AppState,
    store::{IdentifierStore, MemoryIdentifierStore, PgIdentifierStore},
};
use unitrace_service::{server, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // RUST_LOG wins over UNITRACE_LOG_LEVEL
    telemetry::init(&config.log_level);

    info!("Starting unitrace serialization service");
    info!(
        listen_addr = %config.listen_addr,
        store = ?config.store,
        allocation = ?config.allocation,
        "Configuration loaded"
    );

    let store: Arc<dyn IdentifierStore> = match config.store {
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

            Arc::new(PgIdentifierStore::new(db.pool().clone()))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory identifier store; records are lost on exit");
            Arc::new(MemoryIdentifierStore::new())
        }
    };

    let allocator = Allocator::new(store, config.allocation);
    allocator.prime().await?;

    let app = api::create_router(AppState::new(allocator));

    let (shutdown_tx, _shutdown_rx) = watch::channel(false);
    server::serve(config.listen_addr, app, shutdown_tx).await?;

    info!("Serialization service shutdown complete");
    Ok(())
}
