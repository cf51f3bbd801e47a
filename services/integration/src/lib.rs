//! unitrace integration service.
//!
//! Forwards event payloads to one external endpoint with bounded,
//! classified retries.

pub mod api;
pub mod config;
pub mod delivery;
pub mod state;
