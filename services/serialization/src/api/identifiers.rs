//! Identifier endpoints: allocation, lookup, status transitions, stats.

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use unitrace_id::Serial;
use unitrace_service::{ApiError, ApiJson, RequestContext, ServiceError};

use crate::allocator::{Allocation, AllocationRequest, Stats};
use crate::lifecycle::StoredStatus;
use crate::state::AppState;
use crate::store::IdentifierRecord;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/validate/{serial}", get(validate))
        .route("/status/{serial}", patch(update_status))
        .route("/stats", get(stats))
        .route("/all", get(list_all))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub serial: Serial,
    pub batch: String,
    pub expiry_date: NaiveDate,
    pub product_code: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub serial: Serial,
    pub status: StoredStatus,
}

async fn generate(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<AllocationRequest>,
) -> Result<Json<Allocation>, ApiError> {
    state
        .allocator()
        .allocate(request)
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}

async fn validate(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(serial): Path<String>,
) -> Result<Json<ValidateResponse>, ApiError> {
    match state.allocator().validate(&serial).await {
        Ok(record) => Ok(Json(ValidateResponse {
            valid: true,
            serial: record.serial,
            batch: record.batch,
            expiry_date: record.expiry_date,
            product_code: record.product_code,
        })),
        Err(err @ ServiceError::NotFound(_)) => Err(ctx.reject(err).with_field("valid", false)),
        Err(err) => Err(ctx.reject(err)),
    }
}

async fn update_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(serial): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let record = state
        .allocator()
        .transition(&serial, request.status.as_deref())
        .await
        .map_err(|e| ctx.reject(e))?;

    Ok(Json(StatusResponse {
        success: true,
        serial: record.serial,
        status: record.status,
    }))
}

async fn stats(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Stats>, ApiError> {
    state
        .allocator()
        .stats()
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}

async fn list_all(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<IdentifierRecord>>, ApiError> {
    state
        .allocator()
        .list()
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}
