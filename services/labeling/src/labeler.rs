//! Label printing.
//!
//! Printing records the label and then asks the serialization service to
//! move the serial to PRINTED. That request is a side effect: the print
//! succeeds whether or not it does.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use unitrace_id::{IdError, LabelPayload, Serial};
use unitrace_service::ServiceError;

use crate::side_effects::SideEffects;
use crate::status_client::StatusUpdater;
use crate::store::{LabelRecord, LabelStore};

pub const MARK_PRINTED: &str = "mark_printed";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    #[serde(default, alias = "gs1")]
    pub label_payload: Option<Value>,
}

impl PrintRequest {
    fn validate(self) -> Result<LabelPayload, ServiceError> {
        let raw = match self.label_payload {
            None | Some(Value::Null) => {
                return Err(ServiceError::validation(
                    "labelPayload",
                    "Label payload is required",
                ))
            }
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(ServiceError::validation(
                    "labelPayload",
                    "Label payload must be a string",
                ))
            }
        };

        parse_payload(&raw)
    }
}

fn parse_payload(raw: &str) -> Result<LabelPayload, ServiceError> {
    LabelPayload::parse(raw).map_err(|e| match e {
        IdError::Empty => ServiceError::validation("labelPayload", "Label payload is required"),
        _ => ServiceError::validation("labelPayload", "Label payload is too long"),
    })
}

#[derive(Clone)]
pub struct Labeler {
    store: Arc<dyn LabelStore>,
    updater: Arc<dyn StatusUpdater>,
    side_effects: SideEffects,
}

impl Labeler {
    pub fn new(
        store: Arc<dyn LabelStore>,
        updater: Arc<dyn StatusUpdater>,
        side_effects: SideEffects,
    ) -> Self {
        Self {
            store,
            updater,
            side_effects,
        }
    }

    pub fn store(&self) -> &Arc<dyn LabelStore> {
        &self.store
    }

    /// Records a print and schedules the PRINTED transition for its serial.
    pub async fn print(
        &self,
        request: PrintRequest,
        request_id: &str,
    ) -> Result<LabelRecord, ServiceError> {
        let payload = request.validate()?;
        let serial = match payload.serial() {
            Ok(serial) => Some(serial),
            Err(e) => {
                info!(label_payload = %payload, reason = %e, "Label carries no serial");
                None
            }
        };

        let record = self
            .store
            .record_print(&payload, serial.as_ref(), Utc::now())
            .await?;

        info!(
            label_payload = %record.label_payload,
            print_count = record.print_count,
            "Label printed"
        );

        if let Some(serial) = serial {
            self.mark_printed(serial, request_id.to_string());
        }

        Ok(record)
    }

    pub async fn get(&self, serial: &str) -> Result<LabelRecord, ServiceError> {
        self.store
            .get_by_serial(&Serial::from_trusted(serial))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Label not found".to_string()))
    }

    /// Looks a label up by its exact payload text.
    pub async fn get_by_payload(&self, raw: Option<&str>) -> Result<LabelRecord, ServiceError> {
        let payload = parse_payload(raw.unwrap_or_default())?;
        self.store
            .get_by_payload(&payload)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Label not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<LabelRecord>, ServiceError> {
        Ok(self.store.list().await?)
    }

    fn mark_printed(&self, serial: Serial, request_id: String) {
        let updater = Arc::clone(&self.updater);
        let target = serial.to_string();
        self.side_effects.spawn(MARK_PRINTED, target, async move {
            updater.mark_printed(&serial, &request_id).await
        });
    }
}
