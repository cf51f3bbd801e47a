//! Application state shared across request handlers.

use std::sync::Arc;

use async_trait::async_trait;
use unitrace_service::{ComponentStatus, ReadinessProbe};

use crate::labeler::Labeler;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    labeler: Labeler,
}

impl AppState {
    pub fn new(labeler: Labeler) -> Self {
        Self {
            inner: Arc::new(AppStateInner { labeler }),
        }
    }

    pub fn labeler(&self) -> &Labeler {
        &self.inner.labeler
    }
}

#[async_trait]
impl ReadinessProbe for AppState {
    fn service_name(&self) -> &'static str {
        "labeling"
    }

    async fn components(&self) -> Vec<(String, ComponentStatus)> {
        let store = match self.labeler().store().health_check().await {
            Ok(()) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::unavailable(e.to_string()),
        };
        vec![("store".to_string(), store)]
    }
}
