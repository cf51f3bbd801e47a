//! Label endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use unitrace_service::{ApiError, ApiJson, RequestContext};

use crate::labeler::PrintRequest;
use crate::state::AppState;
use crate::store::LabelRecord;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/print", post(print_label))
        .route("/labels", get(list_labels))
        .route("/labels/{serial}", get(get_label))
        .route("/by-gs1", get(get_label_by_payload))
}

#[derive(Debug, Deserialize)]
pub struct PayloadQuery {
    #[serde(alias = "labelPayload")]
    pub gs1: Option<String>,
}

async fn print_label(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<PrintRequest>,
) -> Result<Json<LabelRecord>, ApiError> {
    state
        .labeler()
        .print(request, &ctx.request_id)
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}

async fn get_label(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(serial): Path<String>,
) -> Result<Json<LabelRecord>, ApiError> {
    state
        .labeler()
        .get(&serial)
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}

async fn get_label_by_payload(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<PayloadQuery>,
) -> Result<Json<LabelRecord>, ApiError> {
    state
        .labeler()
        .get_by_payload(query.gs1.as_deref())
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}

async fn list_labels(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<LabelRecord>>, ApiError> {
    state
        .labeler()
        .list()
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}
