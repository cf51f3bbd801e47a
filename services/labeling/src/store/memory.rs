use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use unitrace_db::StoreError;
use unitrace_id::{LabelPayload, Serial};

use super::{LabelRecord, LabelStore, PRINTED};

#[derive(Debug, Default)]
pub struct MemoryLabelStore {
    labels: RwLock<HashMap<LabelPayload, LabelRecord>>,
}

impl MemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LabelStore for MemoryLabelStore {
    async fn record_print(
        &self,
        payload: &LabelPayload,
        serial: Option<&Serial>,
        printed_at: DateTime<Utc>,
    ) -> Result<LabelRecord, StoreError> {
        let mut labels = self.labels.write().await;
        let record = labels
            .entry(payload.clone())
            .and_modify(|r| {
                r.print_count += 1;
                r.status = PRINTED.to_string();
                r.last_printed_at = printed_at;
            })
            .or_insert_with(|| LabelRecord {
                label_payload: payload.clone(),
                serial: serial.cloned(),
                status: PRINTED.to_string(),
                print_count: 1,
                first_printed_at: printed_at,
                last_printed_at: printed_at,
            });
        Ok(record.clone())
    }

    async fn get_by_payload(
        &self,
        payload: &LabelPayload,
    ) -> Result<Option<LabelRecord>, StoreError> {
        Ok(self.labels.read().await.get(payload).cloned())
    }

    async fn get_by_serial(&self, serial: &Serial) -> Result<Option<LabelRecord>, StoreError> {
        Ok(self
            .labels
            .read()
            .await
            .values()
            .filter(|r| r.serial.as_ref() == Some(serial))
            .max_by_key(|r| r.last_printed_at)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<LabelRecord>, StoreError> {
        let mut records: Vec<_> = self.labels.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.last_printed_at.cmp(&a.last_printed_at));
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_reprint_bumps_count() {
        let store = MemoryLabelStore::new();
        let serial = Serial::from_number(10000001);
        let payload = LabelPayload::for_serial(&serial);
        let t0 = Utc::now();

        store.record_print(&payload, Some(&serial), t0).await.unwrap();
        let again = store
            .record_print(&payload, Some(&serial), t0 + Duration::seconds(5))
            .await
            .unwrap();

        assert_eq!(again.print_count, 2);
        assert_eq!(again.first_printed_at, t0);
        assert_eq!(again.last_printed_at, t0 + Duration::seconds(5));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_serial_prefers_latest_print() {
        let store = MemoryLabelStore::new();
        let serial = Serial::from_number(10000001);
        let t0 = Utc::now();
        let long = LabelPayload::parse("(01)09506000134352(21)10000001").unwrap();

        store
            .record_print(&LabelPayload::for_serial(&serial), Some(&serial), t0)
            .await
            .unwrap();
        store
            .record_print(&long, Some(&serial), t0 + Duration::seconds(1))
            .await
            .unwrap();

        let found = store.get_by_serial(&serial).await.unwrap().unwrap();
        assert_eq!(found.label_payload, long);
        assert!(store
            .get_by_serial(&Serial::from_number(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_get_by_payload_is_exact() {
        let store = MemoryLabelStore::new();
        let serial = Serial::from_number(10000001);
        let payload = LabelPayload::for_serial(&serial);
        store
            .record_print(&payload, Some(&serial), Utc::now())
            .await
            .unwrap();

        let found = store.get_by_payload(&payload).await.unwrap().unwrap();
        assert_eq!(found.serial, Some(serial));
        let other = LabelPayload::parse("2110000001").unwrap();
        assert!(store.get_by_payload(&other).await.unwrap().is_none());
    }
}
