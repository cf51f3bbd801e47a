//! unitrace labeling service.
//!
//! Records label prints and asks the serialization service to mark the
//! printed serial. A failed status update never fails the print.

pub mod api;
pub mod config;
pub mod labeler;
pub mod side_effects;
pub mod state;
pub mod status_client;
pub mod store;

use std::path::PathBuf;

/// Directories searched for this service's SQL migrations.
pub fn migration_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./migrations"),
        PathBuf::from("services/labeling/migrations"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    ]
}
