//! Application state shared across request handlers.

use std::sync::Arc;

use async_trait::async_trait;
use unitrace_service::{ComponentStatus, ReadinessProbe};

use crate::delivery::Deliverer;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    deliverer: Deliverer,
}

impl AppState {
    pub fn new(deliverer: Deliverer) -> Self {
        Self {
            inner: Arc::new(AppStateInner { deliverer }),
        }
    }

    pub fn deliverer(&self) -> &Deliverer {
        &self.inner.deliverer
    }
}

#[async_trait]
impl ReadinessProbe for AppState {
    fn service_name(&self) -> &'static str {
        "integration"
    }

    /// The external system is not probed; it is only contacted on push.
    async fn components(&self) -> Vec<(String, ComponentStatus)> {
        Vec::new()
    }
}
