use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use unitrace_db::StoreError;
use unitrace_id::{LabelPayload, Serial};

use super::{LabelRecord, LabelStore, PRINTED};

const RETURNING: &str =
    "label_payload, serial, status, print_count, first_printed_at, last_printed_at";

#[derive(Clone)]
pub struct PgLabelStore {
    pool: PgPool,
}

impl PgLabelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<LabelRecord, sqlx::Error> {
    let label_payload: String = row.try_get("label_payload")?;
    let serial: Option<String> = row.try_get("serial")?;
    let print_count: i32 = row.try_get("print_count")?;

    Ok(LabelRecord {
        label_payload: LabelPayload::from_trusted(label_payload),
        serial: serial.map(Serial::from_trusted),
        status: row.try_get("status")?,
        print_count: i64::from(print_count),
        first_printed_at: row.try_get("first_printed_at")?,
        last_printed_at: row.try_get("last_printed_at")?,
    })
}

#[async_trait]
impl LabelStore for PgLabelStore {
    async fn record_print(
        &self,
        payload: &LabelPayload,
        serial: Option<&Serial>,
        printed_at: DateTime<Utc>,
    ) -> Result<LabelRecord, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO labels (
                label_payload, serial, status, print_count, first_printed_at, last_printed_at
            )
            VALUES ($1, $2, $3, 1, $4, $4)
            ON CONFLICT (label_payload) DO UPDATE
            SET print_count = labels.print_count + 1,
                status = EXCLUDED.status,
                last_printed_at = EXCLUDED.last_printed_at
            RETURNING {RETURNING}
            "#
        ))
        .bind(payload.as_str())
        .bind(serial.map(Serial::as_str))
        .bind(PRINTED)
        .bind(printed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        record_from_row(&row).map_err(StoreError::Query)
    }

    async fn get_by_payload(
        &self,
        payload: &LabelPayload,
    ) -> Result<Option<LabelRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {RETURNING} FROM labels WHERE label_payload = $1"
        ))
        .bind(payload.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(StoreError::Query)
    }

    async fn get_by_serial(&self, serial: &Serial) -> Result<Option<LabelRecord>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {RETURNING} FROM labels
            WHERE serial = $1
            ORDER BY last_printed_at DESC
            LIMIT 1
            "#
        ))
        .bind(serial.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(StoreError::Query)
    }

    async fn list(&self) -> Result<Vec<LabelRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {RETURNING} FROM labels ORDER BY last_printed_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        rows.iter()
            .map(record_from_row)
            .collect::<Result<_, _>>()
            .map_err(StoreError::Query)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }
}
