//! unitrace labeling service binary.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use unitrace_db::{Database, StoreBackend};
use unitrace_labeling::{
    api, config,
    labeler::Labeler,
    migration_dirs,
    side_effects::{spawn_reporter, SideEffects},
    state::AppState,
    status_client::HttpStatusUpdater,
    store::{LabelStore, MemoryLabelStore, PgLabelStore},
};
use unitrace_service::{server, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // RUST_LOG wins over UNITRACE_LOG_LEVEL
    telemetry::init(&config.log_level);

    info!("Starting unitrace labeling service");
    info!(
        listen_addr = %config.listen_addr,
        store = ?config.store,
        serialization_url = %config.serialization_url,
        "Configuration loaded"
    );

    let store: Arc<dyn LabelStore> = match config.store {
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

            Arc::new(PgLabelStore::new(db.pool().clone()))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory label store; records are lost on exit");
            Arc::new(MemoryLabelStore::new())
        }
    };

    let updater = Arc::new(HttpStatusUpdater::new(
        &config.serialization_url,
        config.status_update_timeout,
    )?);

    let (side_effects, failures) = SideEffects::channel();
    let reporter = spawn_reporter(failures);

    let labeler = Labeler::new(store, updater, side_effects);
    let app = api::create_router(AppState::new(labeler));

    let (shutdown_tx, _shutdown_rx) = watch::channel(false);
    server::serve(config.listen_addr, app, shutdown_tx).await?;

    reporter.abort();
    info!("Labeling service shutdown complete");
    Ok(())
}
