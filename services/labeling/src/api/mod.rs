//! HTTP API handlers and routing.

mod labels;

use axum::Router;
use unitrace_service::{health, server};

use crate::state::AppState;

/// Create the service router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(health::routes::<AppState>())
        .merge(labels::routes())
        .with_state(state);

    server::with_middleware(router)
}
