use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use unitrace_db::StoreError;
use unitrace_id::{ContainerId, Serial};

use super::{ContainerRecord, ContainerStore, ContainerSummary};

/// Store for container records in the `containers` table.
#[derive(Clone)]
pub struct PgContainerStore {
    pool: PgPool,
}

impl PgContainerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_i64(value: u64, what: &str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Decode(format!("{what} {value} out of range")))
}

fn record_from_row(row: &PgRow) -> Result<ContainerRecord, sqlx::Error> {
    let container_id: String = row.try_get("container_id")?;
    let members: Vec<String> = row.try_get("members")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(ContainerRecord {
        container_id: ContainerId::from_trusted(container_id),
        members: members.into_iter().map(Serial::from_trusted).collect(),
        created_at,
    })
}

fn summary_from_row(row: &PgRow) -> Result<ContainerSummary, sqlx::Error> {
    let container_id: String = row.try_get("container_id")?;
    let member_count: i32 = row.try_get("member_count")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(ContainerSummary {
        container_id: ContainerId::from_trusted(container_id),
        member_count: i64::from(member_count),
        created_at,
    })
}

#[async_trait]
impl ContainerStore for PgContainerStore {
    async fn insert(&self, record: &ContainerRecord) -> Result<(), StoreError> {
        let members: Vec<String> = record.members.iter().map(|m| m.as_str().to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO containers (container_id, members, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(record.container_id.as_str())
        .bind(members)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, &format!("container {}", record.container_id)))?;

        Ok(())
    }

    async fn get(&self, id: &ContainerId) -> Result<Option<ContainerRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT container_id, members, created_at FROM containers WHERE container_id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(StoreError::Query)
    }

    async fn exists(&self, id: &ContainerId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM containers WHERE container_id = $1)",
        )
        .bind(id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<ContainerSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT container_id, cardinality(members) AS member_count, created_at
            FROM containers
            ORDER BY created_at DESC, container_id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(to_i64(limit, "limit")?)
        .bind(to_i64(offset, "offset")?)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.iter()
            .map(summary_from_row)
            .collect::<Result<_, _>>()
            .map_err(StoreError::Query)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM containers")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        u64::try_from(count).map_err(|_| StoreError::Decode(format!("negative count {count}")))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }
}
