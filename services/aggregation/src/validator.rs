//! Serial existence checks against the serialization service.
//!
//! The answer is three-way. A serial is confirmed present, confirmed absent,
//! or the check failed. A failed check is never read as either answer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};
use unitrace_id::Serial;
use unitrace_service::request_context::REQUEST_ID_HEADER;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("unreadable response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Answers whether a serial has been allocated.
#[async_trait]
pub trait SerialValidator: Send + Sync {
    /// `Ok(true)` if the serial exists, `Ok(false)` if it definitely does not.
    async fn exists(&self, serial: &Serial, request_id: &str) -> Result<bool, ValidatorError>;
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    valid: bool,
}

/// [`SerialValidator`] backed by `GET {base_url}/validate/{serial}`.
pub struct HttpSerialValidator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSerialValidator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SerialValidator for HttpSerialValidator {
    async fn exists(&self, serial: &Serial, request_id: &str) -> Result<bool, ValidatorError> {
        let url = format!("{}/validate/{}", self.base_url, serial);
        debug!(url = %url, "Validating serial");

        let response = self
            .client
            .get(&url)
            .header(REQUEST_ID_HEADER, request_id)
            .send()
            .await
            .map_err(ValidatorError::Transport)?;

        match response.status() {
            StatusCode::OK => {
                let body: ValidateResponse =
                    response.json().await.map_err(ValidatorError::Decode)?;
                Ok(body.valid)
            }
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %body, serial = %serial, "Serial validation failed");
                Err(ValidatorError::UnexpectedStatus(status))
            }
        }
    }
}
