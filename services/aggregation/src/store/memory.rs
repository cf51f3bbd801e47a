use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use unitrace_db::StoreError;
use unitrace_id::ContainerId;

use super::{ContainerRecord, ContainerStore, ContainerSummary};

/// Process-local [`ContainerStore`].
#[derive(Debug, Default)]
pub struct MemoryContainerStore {
    containers: RwLock<HashMap<ContainerId, ContainerRecord>>,
}

impl MemoryContainerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContainerStore for MemoryContainerStore {
    async fn insert(&self, record: &ContainerRecord) -> Result<(), StoreError> {
        let mut containers = self.containers.write().await;
        if containers.contains_key(&record.container_id) {
            return Err(StoreError::Duplicate(format!(
                "container {}",
                record.container_id
            )));
        }
        containers.insert(record.container_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &ContainerId) -> Result<Option<ContainerRecord>, StoreError> {
        Ok(self.containers.read().await.get(id).cloned())
    }

    async fn exists(&self, id: &ContainerId) -> Result<bool, StoreError> {
        Ok(self.containers.read().await.contains_key(id))
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<ContainerSummary>, StoreError> {
        let containers = self.containers.read().await;
        let mut summaries: Vec<_> = containers.values().map(ContainerRecord::summary).collect();
        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.container_id.cmp(&a.container_id))
        });
        Ok(summaries
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.containers.read().await.len() as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use unitrace_id::Serial;

    fn container(id: &str, age_secs: i64) -> ContainerRecord {
        ContainerRecord {
            container_id: ContainerId::parse(id).unwrap(),
            members: vec![Serial::from_number(10000001)],
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_offset() {
        let store = MemoryContainerStore::new();
        store.insert(&container("OLD", 30)).await.unwrap();
        store.insert(&container("MID", 20)).await.unwrap();
        store.insert(&container("NEW", 10)).await.unwrap();

        let page: Vec<_> = store
            .list(1, 5)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.container_id.into_inner())
            .collect();
        assert_eq!(page, vec!["MID", "OLD"]);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_insert_keeps_original() {
        let store = MemoryContainerStore::new();
        store.insert(&container("C1", 0)).await.unwrap();

        let mut other = container("C1", 0);
        other.members.push(Serial::from_number(10000002));
        assert!(matches!(
            store.insert(&other).await,
            Err(StoreError::Duplicate(_))
        ));

        let kept = store
            .get(&ContainerId::parse("C1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.members.len(), 1);
    }
}
