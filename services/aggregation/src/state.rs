//! Application state shared across request handlers.

use std::sync::Arc;

use async_trait::async_trait;
use unitrace_service::{ComponentStatus, ReadinessProbe};

use crate::coordinator::Coordinator;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    coordinator: Coordinator,
}

impl AppState {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            inner: Arc::new(AppStateInner { coordinator }),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.inner.coordinator
    }
}

#[async_trait]
impl ReadinessProbe for AppState {
    fn service_name(&self) -> &'static str {
        "aggregation"
    }

    async fn components(&self) -> Vec<(String, ComponentStatus)> {
        let store = match self.coordinator().store().health_check().await {
            Ok(()) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::unavailable(e.to_string()),
        };
        vec![("store".to_string(), store)]
    }
}
