//! Outbound delivery to the external system.
//!
//! Each push is retried up to [`RetryPolicy::max_attempts`] times. A 4xx
//! answer is a definitive rejection and ends the push at once; timeouts,
//! connection failures and 5xx answers are retried with backoff. Every
//! attempt carries the same trace id in `X-Request-ID`.
//!
//! The receiver gets no idempotency key, so a lost success response
//! followed by a retry delivers the payload twice.

mod retry;
mod sleep;

pub use retry::RetryPolicy;
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};

use std::sync::Arc;

use reqwest::{redirect, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use unitrace_id::TraceId;
use unitrace_service::request_context::REQUEST_ID_HEADER;

/// Why one attempt did not succeed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The receiver answered with a non-success status.
    #[error("external system answered {0}")]
    Status(StatusCode),

    /// No response arrived: timeout, refused connection, reset.
    #[error("external system unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The request could not be built or sent at all.
    #[error("request could not be sent: {0}")]
    Internal(#[source] reqwest::Error),
}

impl AttemptError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            AttemptError::Internal(err)
        } else {
            AttemptError::Unreachable(err)
        }
    }

    /// Client-class failures and local errors are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Status(status) => !status.is_client_error(),
            AttemptError::Unreachable(_) => true,
            AttemptError::Internal(_) => false,
        }
    }
}

/// Final result of one push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx or 3xx from the receiver.
    Posted { upstream_status: u16 },
    /// The receiver answered with an error status.
    Rejected { upstream_status: u16 },
    /// The receiver never answered.
    Unreachable,
    /// The request could not be sent.
    Internal,
}

#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub trace_id: TraceId,
    pub attempts: u32,
    pub outcome: DeliveryOutcome,
}

/// Posts payloads to one external endpoint.
#[derive(Clone)]
pub struct Deliverer {
    client: reqwest::Client,
    endpoint: String,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Deliverer {
    pub fn new(
        endpoint: impl Into<String>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(policy.attempt_timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            policy,
            sleeper,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Delivers `payload`, retrying per the policy.
    pub async fn push(&self, payload: &Value, trace_id: TraceId) -> DeliveryReport {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(
                trace_id = %trace_id,
                attempt,
                max_attempts,
                "Sending payload to external system"
            );

            let err = match self.attempt(payload, &trace_id).await {
                Ok(status) => {
                    info!(
                        trace_id = %trace_id,
                        attempt,
                        status = status.as_u16(),
                        "External system accepted payload"
                    );
                    return DeliveryReport {
                        trace_id,
                        attempts: attempt,
                        outcome: DeliveryOutcome::Posted {
                            upstream_status: status.as_u16(),
                        },
                    };
                }
                Err(err) => err,
            };

            warn!(trace_id = %trace_id, attempt, error = %err, "Delivery attempt failed");

            let backoff = if err.is_retryable() && attempt < max_attempts {
                self.policy.backoff_after(attempt)
            } else {
                None
            };

            match backoff {
                Some(delay) => {
                    info!(
                        trace_id = %trace_id,
                        delay_ms = delay.as_millis() as u64,
                        "Waiting before retry"
                    );
                    self.sleeper.sleep(delay).await;
                }
                None => {
                    return DeliveryReport {
                        trace_id,
                        attempts: attempt,
                        outcome: match err {
                            AttemptError::Status(status) => DeliveryOutcome::Rejected {
                                upstream_status: status.as_u16(),
                            },
                            AttemptError::Unreachable(_) => DeliveryOutcome::Unreachable,
                            AttemptError::Internal(_) => DeliveryOutcome::Internal,
                        },
                    };
                }
            }
        }
    }

    async fn attempt(
        &self,
        payload: &Value,
        trace_id: &TraceId,
    ) -> Result<StatusCode, AttemptError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(REQUEST_ID_HEADER, trace_id.to_string())
            .json(payload)
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            Ok(status)
        } else {
            Err(AttemptError::Status(status))
        }
    }
}
