//! Container endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unitrace_id::{ContainerId, Serial};
use unitrace_service::{ApiError, ApiJson, RequestContext};

use crate::coordinator::{ContainerPage, CreateContainerRequest, PageRequest};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/aggregate", post(create_container))
        .route("/aggregation/{container_id}", get(get_container))
        .route("/aggregations", get(list_containers))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContainerResponse {
    pub status: &'static str,
    pub container_id: ContainerId,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResponse {
    pub container_id: ContainerId,
    pub members: Vec<Serial>,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Raw query values; parsed leniently by [`PageRequest::from_query`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContainersQuery {
    pub page: Option<String>,
    #[serde(alias = "limit")]
    pub page_size: Option<String>,
}

async fn create_container(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CreateContainerRequest>,
) -> Result<(StatusCode, Json<CreateContainerResponse>), ApiError> {
    let record = state
        .coordinator()
        .create(request, &ctx.request_id)
        .await
        .map_err(|e| ctx.reject(e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateContainerResponse {
            status: "AGGREGATED",
            member_count: record.members.len(),
            container_id: record.container_id,
            created_at: record.created_at,
        }),
    ))
}

async fn get_container(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(container_id): Path<String>,
) -> Result<Json<ContainerResponse>, ApiError> {
    let record = state
        .coordinator()
        .get(&container_id)
        .await
        .map_err(|e| ctx.reject(e))?;

    Ok(Json(ContainerResponse {
        member_count: record.members.len(),
        container_id: record.container_id,
        members: record.members,
        created_at: record.created_at,
    }))
}

async fn list_containers(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListContainersQuery>,
) -> Result<Json<ContainerPage>, ApiError> {
    let page = PageRequest::from_query(query.page.as_deref(), query.page_size.as_deref());
    state
        .coordinator()
        .list(page)
        .await
        .map(Json)
        .map_err(|e| ctx.reject(e))
}
