//! Printed label records.

mod memory;
mod postgres;

pub use memory::MemoryLabelStore;
pub use postgres::PgLabelStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use unitrace_db::StoreError;
use unitrace_id::{LabelPayload, Serial};

pub const PRINTED: &str = "PRINTED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub label_payload: LabelPayload,
    /// `None` when the payload carries no recognisable serial.
    pub serial: Option<Serial>,
    pub status: String,
    pub print_count: i64,
    pub first_printed_at: DateTime<Utc>,
    pub last_printed_at: DateTime<Utc>,
}

#[async_trait]
pub trait LabelStore: Send + Sync {
    /// Records one print of `payload`, creating the record on first print.
    async fn record_print(
        &self,
        payload: &LabelPayload,
        serial: Option<&Serial>,
        printed_at: DateTime<Utc>,
    ) -> Result<LabelRecord, StoreError>;

    /// The label with exactly this payload.
    async fn get_by_payload(&self, payload: &LabelPayload)
        -> Result<Option<LabelRecord>, StoreError>;

    /// The most recently printed label for a serial.
    async fn get_by_serial(&self, serial: &Serial) -> Result<Option<LabelRecord>, StoreError>;

    /// Every label, most recently printed first.
    async fn list(&self) -> Result<Vec<LabelRecord>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
