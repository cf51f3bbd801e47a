//! Health check endpoints.
//!
//! These endpoints are used by load balancers and orchestration systems
//! to determine if the service is healthy and ready to receive traffic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Implemented by service state so readiness can report on its dependencies.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Service name reported in health responses.
    fn service_name(&self) -> &'static str;

    /// Checks each dependency. An empty list means the service has none.
    async fn components(&self) -> Vec<(String, ComponentStatus)>;
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status: "ok" or "degraded".
    pub status: String,

    /// Service name.
    pub service: String,

    /// Service version.
    pub version: String,

    /// Current timestamp (ISO 8601).
    pub timestamp: String,

    /// Per-dependency status, only on readiness checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, ComponentStatus>>,
}

/// Individual component status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Status: "ok" or "unavailable".
    pub status: String,

    /// Optional message with details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: "unavailable".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Create health check routes.
pub fn routes<S>() -> Router<S>
where
    S: ReadinessProbe + Clone + 'static,
{
    Router::new()
        .route("/healthz", get(healthz::<S>))
        .route("/readyz", get(readyz::<S>))
        .route("/livez", get(livez))
        .route("/health", get(livez))
}

/// Basic health check. Does not check dependencies.
async fn healthz<S: ReadinessProbe>(State(state): State<S>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.service_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        components: None,
    })
}

/// Readiness check. Returns 503 if any dependency is unavailable.
async fn readyz<S: ReadinessProbe>(State(state): State<S>) -> impl IntoResponse {
    let components: BTreeMap<String, ComponentStatus> =
        state.components().await.into_iter().collect();
    let all_ok = components.values().all(ComponentStatus::is_ok);

    let response = HealthResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        service: state.service_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        components: Some(components),
    };

    if all_ok {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Liveness check with an empty body.
async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct FakeState {
        store_up: bool,
    }

    #[async_trait]
    impl ReadinessProbe for FakeState {
        fn service_name(&self) -> &'static str {
            "fake"
        }

        async fn components(&self) -> Vec<(String, ComponentStatus)> {
            let status = if self.store_up {
                ComponentStatus::ok()
            } else {
                ComponentStatus::unavailable("connection refused")
            };
            vec![("store".to_string(), status)]
        }
    }

    async fn get_status(state: FakeState, path: &str) -> StatusCode {
        let app = routes::<FakeState>().with_state(state);
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_livez_returns_ok() {
        let response = livez().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_reflects_components() {
        assert_eq!(
            get_status(FakeState { store_up: true }, "/readyz").await,
            StatusCode::OK
        );
        assert_eq!(
            get_status(FakeState { store_up: false }, "/readyz").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(FakeState { store_up: false }, "/healthz").await,
            StatusCode::OK
        );
    }
}
