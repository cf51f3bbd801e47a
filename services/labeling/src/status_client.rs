//! Lifecycle updates sent to the serialization service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use unitrace_id::Serial;
use unitrace_service::request_context::REQUEST_ID_HEADER;

#[derive(Debug, Error)]
pub enum StatusUpdateError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("serialization service answered {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Marks serials as printed.
#[async_trait]
pub trait StatusUpdater: Send + Sync {
    async fn mark_printed(&self, serial: &Serial, request_id: &str)
        -> Result<(), StatusUpdateError>;
}

/// [`StatusUpdater`] backed by `PATCH {base_url}/status/{serial}`.
pub struct HttpStatusUpdater {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusUpdater {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StatusUpdater for HttpStatusUpdater {
    async fn mark_printed(
        &self,
        serial: &Serial,
        request_id: &str,
    ) -> Result<(), StatusUpdateError> {
        let url = format!("{}/status/{}", self.base_url, serial);
        debug!(url = %url, "Marking serial printed");

        let response = self
            .client
            .patch(&url)
            .header(REQUEST_ID_HEADER, request_id)
            .json(&json!({ "status": "PRINTED" }))
            .send()
            .await
            .map_err(StatusUpdateError::Transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StatusUpdateError::Rejected { status, body })
    }
}
