//! unitrace serialization service.
//!
//! Allocates unit serials and enforces the GENERATED → PRINTED → SCANNED
//! lifecycle. Other services confirm a serial exists through
//! `GET /validate/{serial}` before acting on it.

pub mod allocator;
pub mod api;
pub mod config;
pub mod lifecycle;
pub mod state;
pub mod store;

use std::path::PathBuf;

/// Directories searched for this service's SQL migrations.
pub fn migration_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./migrations"),
        PathBuf::from("services/serialization/migrations"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    ]
}
