//! All-or-nothing container creation.
//!
//! A container is committed only after every member has been confirmed by
//! the serialization service. The first absent member aborts the request,
//! and so does any member whose existence could not be determined. Nothing
//! is written in either case.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use unitrace_db::StoreError;
use unitrace_id::{ContainerId, IdError, Serial};
use unitrace_service::ServiceError;

use crate::store::{ContainerRecord, ContainerStore, ContainerSummary};
use crate::validator::SerialValidator;

/// Most members one container may hold.
pub const MAX_MEMBERS: usize = 1000;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Highest page number; keeps every offset within a `BIGINT`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

const DUPLICATE_CONTAINER: &str = "Container ID already exists";

/// Container creation input as received.
///
/// Fields stay untyped so each bad element can be reported by index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContainerRequest {
    #[serde(default, alias = "cartonId")]
    pub container_id: Option<Value>,
    #[serde(default, alias = "serials")]
    pub members: Option<Value>,
}

struct ValidContainer {
    container_id: ContainerId,
    members: Vec<Serial>,
}

fn member_error(index: usize, err: &IdError) -> ServiceError {
    let message = match err {
        IdError::Empty => format!("Member at index {index} cannot be empty"),
        IdError::TooLong { .. } => format!("Member at index {index} is too long"),
        _ => format!("Member at index {index} contains invalid characters"),
    };
    ServiceError::validation(format!("members[{index}]"), message)
}

impl CreateContainerRequest {
    fn validate(self) -> Result<ValidContainer, ServiceError> {
        let container_id = match self.container_id {
            None | Some(Value::Null) => {
                return Err(ServiceError::validation(
                    "containerId",
                    "Container ID is required",
                ))
            }
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(ServiceError::validation(
                    "containerId",
                    "Container ID must be a string",
                ))
            }
        };
        let container_id = ContainerId::parse(&container_id).map_err(|e| match e {
            IdError::Empty => ServiceError::validation("containerId", "Container ID is required"),
            _ => ServiceError::validation("containerId", "Container ID is too long"),
        })?;

        let raw_members = match self.members {
            None | Some(Value::Null) => {
                return Err(ServiceError::validation(
                    "members",
                    "Members array is required",
                ))
            }
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ServiceError::validation(
                    "members",
                    "Members must be an array",
                ))
            }
        };
        if raw_members.is_empty() {
            return Err(ServiceError::validation(
                "members",
                "Members array cannot be empty",
            ));
        }
        if raw_members.len() > MAX_MEMBERS {
            return Err(ServiceError::validation(
                "members",
                format!("Too many members in array (max {MAX_MEMBERS})"),
            ));
        }

        let members = raw_members
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) => Serial::parse(s).map_err(|e| member_error(index, &e)),
                _ => Err(ServiceError::validation(
                    format!("members[{index}]"),
                    format!("Member at index {index} must be a string"),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidContainer {
            container_id,
            members,
        })
    }
}

/// Offset pagination over containers, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Lenient parsing: anything missing, unparseable or below 1 falls back
    /// to the default. `page` is capped at [`MAX_PAGE`] and `page_size` at
    /// [`MAX_PAGE_SIZE`].
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        fn positive(raw: Option<&str>) -> Option<u64> {
            raw.and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|n| *n >= 1)
        }

        Self {
            page: positive(page).unwrap_or(1).min(MAX_PAGE),
            page_size: positive(page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerPage {
    pub containers: Vec<ContainerSummary>,
    pub pagination: Pagination,
}

/// Validates members and commits containers.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn ContainerStore>,
    validator: Arc<dyn SerialValidator>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn ContainerStore>, validator: Arc<dyn SerialValidator>) -> Self {
        Self { store, validator }
    }

    pub fn store(&self) -> &Arc<dyn ContainerStore> {
        &self.store
    }

    /// Creates a container once every member is confirmed to exist.
    ///
    /// `request_id` is forwarded on each validation call.
    pub async fn create(
        &self,
        request: CreateContainerRequest,
        request_id: &str,
    ) -> Result<ContainerRecord, ServiceError> {
        let valid = request.validate()?;

        if self.store.exists(&valid.container_id).await? {
            return Err(ServiceError::Conflict(DUPLICATE_CONTAINER.to_string()));
        }

        for serial in &valid.members {
            match self.validator.exists(serial, request_id).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        container_id = %valid.container_id,
                        serial = %serial,
                        "Rejecting container with unknown member"
                    );
                    return Err(ServiceError::validation(
                        "members",
                        format!("Serial {serial} does not exist"),
                    ));
                }
                Err(e) => {
                    warn!(
                        container_id = %valid.container_id,
                        serial = %serial,
                        error = %e,
                        "Could not validate member"
                    );
                    return Err(ServiceError::Upstream(format!(
                        "Error validating serial {serial}"
                    )));
                }
            }
        }

        let record = ContainerRecord {
            container_id: valid.container_id,
            members: valid.members,
            created_at: Utc::now(),
        };

        match self.store.insert(&record).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                warn!(
                    container_id = %record.container_id,
                    "Container created concurrently during validation"
                );
                return Err(ServiceError::Conflict(DUPLICATE_CONTAINER.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            container_id = %record.container_id,
            members = record.members.len(),
            "Container aggregated"
        );
        Ok(record)
    }

    pub async fn get(&self, container_id: &str) -> Result<ContainerRecord, ServiceError> {
        self.store
            .get(&ContainerId::from_trusted(container_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Container not found".to_string()))
    }

    pub async fn list(&self, page: PageRequest) -> Result<ContainerPage, ServiceError> {
        let containers = self.store.list(page.offset(), page.page_size).await?;
        let total = self.store.count().await?;

        Ok(ContainerPage {
            containers,
            pagination: Pagination {
                page: page.page,
                page_size: page.page_size,
                total,
                pages: total.div_ceil(page.page_size),
            },
        })
    }
}
