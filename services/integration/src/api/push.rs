//! `POST /push`: forward an arbitrary JSON object to the external system.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use unitrace_id::TraceId;
use unitrace_service::{ApiError, ApiJson, ErrorKind, RequestContext, ServiceError};

use crate::delivery::{DeliveryOutcome, DeliveryReport};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/push", post(push))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub status: &'static str,
    pub trace_id: TraceId,
    pub upstream_status: u16,
    pub attempts: u32,
}

fn failed(err: ApiError, report: &DeliveryReport) -> ApiError {
    err.with_field("status", "FAILED")
        .with_field("traceId", report.trace_id.to_string())
        .with_field("attempts", report.attempts)
}

fn check_payload(payload: &Value) -> Result<(), ServiceError> {
    match payload {
        Value::Object(_) => Ok(()),
        Value::Null => Err(ServiceError::validation("payload", "Payload is required")),
        _ => Err(ServiceError::validation(
            "payload",
            "Payload must be an object",
        )),
    }
}

async fn push(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Json<PushResponse>, ApiError> {
    if let Err(e) = check_payload(&payload) {
        return Err(ctx.reject(e).with_field("status", "FAILED"));
    }

    let trace_id = TraceId::new();
    info!(
        request_id = %ctx.request_id,
        trace_id = %trace_id,
        endpoint = %state.deliverer().endpoint(),
        "Pushing payload"
    );

    let report = state.deliverer().push(&payload, trace_id).await;

    match report.outcome {
        DeliveryOutcome::Posted { upstream_status } => Ok(Json(PushResponse {
            status: "POSTED",
            trace_id: report.trace_id,
            upstream_status,
            attempts: report.attempts,
        })),
        DeliveryOutcome::Rejected { upstream_status } => Err(failed(
            ctx.reject(ApiError::new(
                StatusCode::BAD_GATEWAY,
                ErrorKind::UpstreamError.as_str(),
                "External system error",
            )),
            &report,
        )
        .with_field("upstreamStatus", upstream_status)),
        DeliveryOutcome::Unreachable => Err(failed(
            ctx.reject(ApiError::new(
                StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::UpstreamError.as_str(),
                "External system unreachable",
            )),
            &report,
        )),
        DeliveryOutcome::Internal => Err(failed(
            ctx.reject(ApiError::internal("Internal error")),
            &report,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_objects_are_pushable() {
        assert!(check_payload(&json!({"a": 1})).is_ok());
        assert!(check_payload(&json!({})).is_ok());
        for bad in [json!([1, 2]), json!("text"), json!(3), json!(null)] {
            assert!(matches!(
                check_payload(&bad),
                Err(ServiceError::Validation { .. })
            ));
        }
    }
}
