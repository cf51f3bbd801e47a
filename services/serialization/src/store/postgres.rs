//! Postgres-backed identifier store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use unitrace_db::StoreError;
use unitrace_id::{LabelPayload, Serial};

use super::{IdentifierRecord, IdentifierStore, StatusCount};
use crate::lifecycle::{Status, StoredStatus};

const SELECT_COLUMNS: &str = r#"
    serial, product_code, batch, manufacture_date, expiry_date,
    label_payload, status, created_at
"#;

/// Store for identifier records in the `identifiers` table.
#[derive(Clone)]
pub struct PgIdentifierStore {
    pool: PgPool,
}

impl PgIdentifierStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct IdentifierRow(IdentifierRecord);

impl<'r> sqlx::FromRow<'r, PgRow> for IdentifierRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let serial: String = row.try_get("serial")?;
        let manufacture_date: NaiveDate = row.try_get("manufacture_date")?;
        let expiry_date: NaiveDate = row.try_get("expiry_date")?;
        let label_payload: String = row.try_get("label_payload")?;
        let status: String = row.try_get("status")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(Self(IdentifierRecord {
            serial: Serial::from_trusted(serial),
            product_code: row.try_get("product_code")?,
            batch: row.try_get("batch")?,
            manufacture_date,
            expiry_date,
            label_payload: LabelPayload::from_trusted(label_payload),
            status: StoredStatus::from_stored(&status),
            created_at,
        }))
    }
}

fn counter_value(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Decode(format!("negative counter {value}")))
}

#[async_trait]
impl IdentifierStore for PgIdentifierStore {
    async fn insert(&self, record: &IdentifierRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO identifiers (
                serial, product_code, batch, manufacture_date, expiry_date,
                label_payload, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.serial.as_str())
        .bind(&record.product_code)
        .bind(&record.batch)
        .bind(record.manufacture_date)
        .bind(record.expiry_date)
        .bind(record.label_payload.as_str())
        .bind(record.status.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, &format!("serial {}", record.serial)))?;

        Ok(())
    }

    async fn get(&self, serial: &Serial) -> Result<Option<IdentifierRecord>, StoreError> {
        let row = sqlx::query_as::<_, IdentifierRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM identifiers WHERE serial = $1"
        ))
        .bind(serial.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(row.map(|r| r.0))
    }

    async fn list(&self) -> Result<Vec<IdentifierRecord>, StoreError> {
        let rows = sqlx::query_as::<_, IdentifierRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM identifiers ORDER BY created_at ASC, serial ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn serials(&self) -> Result<Vec<Serial>, StoreError> {
        let serials = sqlx::query_scalar::<_, String>("SELECT serial FROM identifiers")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        Ok(serials.into_iter().map(Serial::from_trusted).collect())
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>, StoreError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM identifiers GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        rows.iter()
            .map(|row| {
                let status: String = row.try_get("status").map_err(StoreError::Query)?;
                let count: i64 = row.try_get("count").map_err(StoreError::Query)?;
                Ok(StatusCount {
                    status: StoredStatus::from_stored(&status),
                    count,
                })
            })
            .collect()
    }

    async fn update_status(
        &self,
        serial: &Serial,
        expected: &StoredStatus,
        next: Status,
    ) -> Result<Option<IdentifierRecord>, StoreError> {
        let row = sqlx::query_as::<_, IdentifierRow>(&format!(
            r#"
            UPDATE identifiers
            SET status = $3
            WHERE serial = $1 AND UPPER(status) = UPPER($2)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(serial.as_str())
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(row.map(|r| r.0))
    }

    async fn next_counter(&self) -> Result<u64, StoreError> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE serial_counter
            SET last_value = last_value + 1
            WHERE id
            RETURNING last_value
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        counter_value(value)
    }

    async fn raise_counter(&self, floor: u64) -> Result<(), StoreError> {
        let floor = i64::try_from(floor)
            .map_err(|_| StoreError::Decode(format!("counter floor {floor} exceeds BIGINT")))?;

        sqlx::query(
            r#"
            UPDATE serial_counter
            SET last_value = GREATEST(last_value, $1)
            WHERE id
            "#,
        )
        .bind(floor)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }
}
