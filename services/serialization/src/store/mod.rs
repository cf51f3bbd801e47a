//! Identifier record storage.
//!
//! The store is the only shared mutable resource of the allocator. Its sole
//! concurrency mechanism is the uniqueness of `serial`: an insert of an
//! existing serial fails with [`StoreError::Duplicate`], and status updates
//! are conditional on the status the caller last read.

mod memory;
mod postgres;

pub use memory::MemoryIdentifierStore;
pub use postgres::PgIdentifierStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use unitrace_db::StoreError;
use unitrace_id::{LabelPayload, Serial};

use crate::lifecycle::{Status, StoredStatus};

/// Largest value the allocation counter can hold (`BIGINT`).
pub const COUNTER_MAX: u64 = i64::MAX as u64;

/// One serialized unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierRecord {
    pub serial: Serial,
    pub product_code: String,
    pub batch: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub label_payload: LabelPayload,
    pub status: StoredStatus,
    pub created_at: DateTime<Utc>,
}

/// Number of records carrying one stored status value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: StoredStatus,
    pub count: i64,
}

/// Durable, key-indexed identifier storage.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// Inserts a new record; fails with `Duplicate` if the serial exists.
    async fn insert(&self, record: &IdentifierRecord) -> Result<(), StoreError>;

    /// Reads one record by serial.
    async fn get(&self, serial: &Serial) -> Result<Option<IdentifierRecord>, StoreError>;

    /// Reads every record, oldest first.
    async fn list(&self) -> Result<Vec<IdentifierRecord>, StoreError>;

    /// Reads every serial.
    async fn serials(&self) -> Result<Vec<Serial>, StoreError>;

    /// Aggregates record counts by stored status value.
    async fn count_by_status(&self) -> Result<Vec<StatusCount>, StoreError>;

    /// Sets `next` only if the record still has status `expected`.
    ///
    /// Returns the updated record, or `None` when the serial is absent or its
    /// status no longer matches.
    async fn update_status(
        &self,
        serial: &Serial,
        expected: &StoredStatus,
        next: Status,
    ) -> Result<Option<IdentifierRecord>, StoreError>;

    /// Atomically increments the allocation counter and returns the new value.
    async fn next_counter(&self) -> Result<u64, StoreError>;

    /// Raises the allocation counter to at least `floor`. Never lowers it.
    ///
    /// Fails when `floor` exceeds [`COUNTER_MAX`].
    async fn raise_counter(&self, floor: u64) -> Result<(), StoreError>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}
