//! In-memory identifier store for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use unitrace_db::StoreError;
use unitrace_id::{Serial, SERIAL_BASE};

use super::{IdentifierRecord, IdentifierStore, StatusCount, COUNTER_MAX};
use crate::lifecycle::{Status, StoredStatus};

#[derive(Debug)]
struct Inner {
    records: HashMap<Serial, IdentifierRecord>,
    counter: u64,
}

/// Process-local [`IdentifierStore`] with the same key semantics as Postgres.
#[derive(Debug)]
pub struct MemoryIdentifierStore {
    inner: RwLock<Inner>,
}

impl MemoryIdentifierStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: HashMap::new(),
                counter: SERIAL_BASE - 1,
            }),
        }
    }
}

impl Default for MemoryIdentifierStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentifierStore for MemoryIdentifierStore {
    async fn insert(&self, record: &IdentifierRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.records.contains_key(&record.serial) {
            return Err(StoreError::Duplicate(format!("serial {}", record.serial)));
        }
        inner
            .records
            .insert(record.serial.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, serial: &Serial) -> Result<Option<IdentifierRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(serial).cloned())
    }

    async fn list(&self) -> Result<Vec<IdentifierRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.serial.cmp(&b.serial))
        });
        Ok(records)
    }

    async fn serials(&self) -> Result<Vec<Serial>, StoreError> {
        Ok(self.inner.read().await.records.keys().cloned().collect())
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>, StoreError> {
        let inner = self.inner.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for record in inner.records.values() {
            *counts.entry(record.status.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(raw, count)| StatusCount {
                status: StoredStatus::from_stored(raw),
                count,
            })
            .collect())
    }

    async fn update_status(
        &self,
        serial: &Serial,
        expected: &StoredStatus,
        next: Status,
    ) -> Result<Option<IdentifierRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(serial) {
            Some(record) if &record.status == expected => {
                record.status = StoredStatus::Known(next);
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn next_counter(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.counter >= COUNTER_MAX {
            return Err(StoreError::Exhausted(format!(
                "allocation counter at {}",
                inner.counter
            )));
        }
        inner.counter += 1;
        Ok(inner.counter)
    }

    async fn raise_counter(&self, floor: u64) -> Result<(), StoreError> {
        if floor > COUNTER_MAX {
            return Err(StoreError::Decode(format!(
                "counter floor {floor} exceeds BIGINT"
            )));
        }
        let mut inner = self.inner.write().await;
        inner.counter = inner.counter.max(floor);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
