//! unitrace aggregation service.
//!
//! Groups allocated serials into containers. Every member is checked
//! against the serialization service before the container is written.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod state;
pub mod store;
pub mod validator;

use std::path::PathBuf;

/// Directories searched for this service's SQL migrations.
pub fn migration_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./migrations"),
        PathBuf::from("services/aggregation/migrations"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    ]
}
