//! Container record storage.
//!
//! A container is written once, in a single insert, and never modified.
//! Uniqueness of `container_id` is the only concurrency guard.

mod memory;
mod postgres;

pub use memory::MemoryContainerStore;
pub use postgres::PgContainerStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use unitrace_db::StoreError;
use unitrace_id::{ContainerId, Serial};

/// A named group of previously allocated serials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub container_id: ContainerId,
    pub members: Vec<Serial>,
    pub created_at: DateTime<Utc>,
}

impl ContainerRecord {
    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            container_id: self.container_id.clone(),
            member_count: self.members.len() as i64,
            created_at: self.created_at,
        }
    }
}

/// List entry for a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub container_id: ContainerId,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ContainerStore: Send + Sync {
    /// Inserts a container; fails with `Duplicate` if the id exists.
    async fn insert(&self, record: &ContainerRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &ContainerId) -> Result<Option<ContainerRecord>, StoreError>;

    async fn exists(&self, id: &ContainerId) -> Result<bool, StoreError>;

    /// Summaries newest first, skipping `offset` and returning at most `limit`.
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<ContainerSummary>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
