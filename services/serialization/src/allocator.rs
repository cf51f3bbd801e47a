//! Serial allocation and status transitions.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use unitrace_db::StoreError;
use unitrace_id::{LabelPayload, Serial, SERIAL_BASE};
use unitrace_service::ServiceError;

use crate::lifecycle::{check_transition, Status, StoredStatus};
use crate::store::{IdentifierRecord, IdentifierStore, COUNTER_MAX};

/// Bound on conditional-update retries when the status moves underneath us.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// How the next serial number is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationStrategy {
    /// Atomic increment of a counter held by the store.
    #[default]
    Counter,
    /// Read every serial, take the largest numeric value and add one.
    ///
    /// Two concurrent allocations can pick the same value. The loser of the
    /// insert gets a `Conflict`.
    Scan,
}

impl FromStr for AllocationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "counter" => Ok(AllocationStrategy::Counter),
            "scan" => Ok(AllocationStrategy::Scan),
            other => Err(format!(
                "unknown allocation strategy '{other}' (expected 'counter' or 'scan')"
            )),
        }
    }
}

/// Allocation input as received. Every field is checked by [`Allocator::allocate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub product_code: Option<String>,
    pub batch: Option<String>,
    pub manufacture_date: Option<String>,
    pub expiry_date: Option<String>,
}

struct ValidAllocation {
    product_code: String,
    batch: String,
    manufacture_date: NaiveDate,
    expiry_date: NaiveDate,
}

fn required(value: Option<String>, field: &str, message: &str) -> Result<String, ServiceError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::validation(field, message))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its UTC date is kept).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc).date_naive())
    })
}

impl AllocationRequest {
    fn validate(self) -> Result<ValidAllocation, ServiceError> {
        let product_code = required(self.product_code, "productCode", "Product code is required")?;
        let batch = required(self.batch, "batch", "Batch is required")?;
        let manufacture_date = required(
            self.manufacture_date,
            "manufactureDate",
            "Manufacturing date is required",
        )?;
        let expiry_date = required(self.expiry_date, "expiryDate", "Expiry date is required")?;

        let manufacture_date = parse_date(&manufacture_date).ok_or_else(|| {
            ServiceError::validation("manufactureDate", "Invalid manufacturing date format")
        })?;
        let expiry_date = parse_date(&expiry_date).ok_or_else(|| {
            ServiceError::validation("expiryDate", "Invalid expiry date format")
        })?;

        if manufacture_date >= expiry_date {
            return Err(ServiceError::validation(
                "manufactureDate",
                "Manufacturing date must be before expiry date",
            ));
        }

        Ok(ValidAllocation {
            product_code,
            batch,
            manufacture_date,
            expiry_date,
        })
    }
}

/// Result of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub serial: Serial,
    pub label_payload: LabelPayload,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Record counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub generated: i64,
    pub printed: i64,
    pub scanned: i64,
    /// Records whose stored status is outside the lifecycle table.
    #[serde(skip_serializing_if = "is_zero")]
    pub other: i64,
    pub total: i64,
    pub pending: i64,
}

/// Allocates serials and moves identifiers through their lifecycle.
#[derive(Clone)]
pub struct Allocator {
    store: Arc<dyn IdentifierStore>,
    strategy: AllocationStrategy,
}

impl Allocator {
    pub fn new(store: Arc<dyn IdentifierStore>, strategy: AllocationStrategy) -> Self {
        Self { store, strategy }
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    pub fn store(&self) -> &Arc<dyn IdentifierStore> {
        &self.store
    }

    /// Raises the allocation counter past every serial already stored.
    ///
    /// Run once at boot so a counter introduced over existing data never
    /// hands out a serial that is already taken. Serials whose numeric value
    /// is beyond [`COUNTER_MAX`] cannot collide with the counter and are
    /// skipped. No-op for `Scan`.
    pub async fn prime(&self) -> Result<(), ServiceError> {
        if self.strategy != AllocationStrategy::Counter {
            return Ok(());
        }
        let (in_range, out_of_range): (Vec<u64>, Vec<u64>) = self
            .store
            .serials()
            .await?
            .iter()
            .filter_map(Serial::numeric_value)
            .filter(|n| *n > 0)
            .partition(|n| *n <= COUNTER_MAX);

        if let Some(largest) = out_of_range.iter().max() {
            warn!(
                skipped = out_of_range.len(),
                largest = *largest,
                "Ignoring stored serials beyond the counter range"
            );
        }
        if let Some(max) = in_range.into_iter().max() {
            self.store.raise_counter(max).await?;
            info!(max_serial = max, "Allocation counter primed");
        }
        Ok(())
    }

    /// Validates the request, picks the next serial and stores the record
    /// at `GENERATED`.
    pub async fn allocate(&self, request: AllocationRequest) -> Result<Allocation, ServiceError> {
        let valid = request.validate()?;
        let serial = self.next_serial().await?;
        let label_payload = LabelPayload::for_serial(&serial);

        let record = IdentifierRecord {
            serial: serial.clone(),
            product_code: valid.product_code,
            batch: valid.batch,
            manufacture_date: valid.manufacture_date,
            expiry_date: valid.expiry_date,
            label_payload: label_payload.clone(),
            status: Status::Generated.into(),
            created_at: Utc::now(),
        };

        if let Err(err) = self.store.insert(&record).await {
            if matches!(err, StoreError::Duplicate(_)) {
                warn!(
                    serial = %serial,
                    strategy = ?self.strategy,
                    "Allocated serial was already taken"
                );
            }
            return Err(err.into());
        }

        info!(serial = %serial, batch = %record.batch, "Serial allocated");
        Ok(Allocation {
            serial,
            label_payload,
        })
    }

    /// Looks up one identifier.
    pub async fn validate(&self, serial: &str) -> Result<IdentifierRecord, ServiceError> {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(ServiceError::validation(
                "serial",
                "Serial number is required",
            ));
        }

        self.store
            .get(&Serial::from_trusted(serial))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Serial not found".to_string()))
    }

    /// Moves an identifier to `requested` if the lifecycle allows it.
    pub async fn transition(
        &self,
        serial: &str,
        requested: Option<&str>,
    ) -> Result<IdentifierRecord, ServiceError> {
        let serial = serial.trim();
        if serial.is_empty() {
            return Err(ServiceError::validation(
                "serial",
                "Serial number is required",
            ));
        }
        let requested: Status = match requested.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse()?,
            _ => return Err(ServiceError::validation("status", "Status is required")),
        };
        let serial = Serial::from_trusted(serial);

        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self
                .store
                .get(&serial)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Serial not found".to_string()))?;

            check_transition(&current.status, requested)?;

            if let Some(updated) = self
                .store
                .update_status(&serial, &current.status, requested)
                .await?
            {
                info!(
                    serial = %serial,
                    from = %current.status,
                    to = %requested,
                    "Status updated"
                );
                return Ok(updated);
            }

            debug!(serial = %serial, attempt, "Status changed concurrently, re-reading");
        }

        Err(ServiceError::Conflict(format!(
            "Serial {serial} changed while updating its status"
        )))
    }

    /// Counts records by status.
    pub async fn stats(&self) -> Result<Stats, ServiceError> {
        let mut stats = Stats::default();
        for entry in self.store.count_by_status().await? {
            match entry.status {
                StoredStatus::Known(Status::Generated) => stats.generated += entry.count,
                StoredStatus::Known(Status::Printed) => stats.printed += entry.count,
                StoredStatus::Known(Status::Scanned) => stats.scanned += entry.count,
                StoredStatus::Legacy(_) => stats.other += entry.count,
            }
        }
        stats.total = stats.generated + stats.printed + stats.scanned + stats.other;
        stats.pending = stats.generated + stats.printed;
        Ok(stats)
    }

    /// Every identifier, oldest first.
    pub async fn list(&self) -> Result<Vec<IdentifierRecord>, ServiceError> {
        Ok(self.store.list().await?)
    }

    async fn next_serial(&self) -> Result<Serial, ServiceError> {
        let n = match self.strategy {
            AllocationStrategy::Counter => self.store.next_counter().await?,
            AllocationStrategy::Scan => match self.max_numeric_serial().await? {
                Some(max) => max.checked_add(1).ok_or_else(|| {
                    ServiceError::Internal("Serial number space exhausted".to_string())
                })?,
                None => SERIAL_BASE,
            },
        };
        Ok(Serial::from_number(n))
    }

    async fn max_numeric_serial(&self) -> Result<Option<u64>, ServiceError> {
        Ok(self
            .store
            .serials()
            .await?
            .iter()
            .filter_map(Serial::numeric_value)
            .filter(|n| *n > 0)
            .max())
    }
}
