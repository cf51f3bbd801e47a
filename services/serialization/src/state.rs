//! Application state shared across request handlers.

use std::sync::Arc;

use async_trait::async_trait;
use unitrace_service::{ComponentStatus, ReadinessProbe};

use crate::allocator::Allocator;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    allocator: Allocator,
}

impl AppState {
    pub fn new(allocator: Allocator) -> Self {
        Self {
            inner: Arc::new(AppStateInner { allocator }),
        }
    }

    pub fn allocator(&self) -> &Allocator {
        &self.inner.allocator
    }
}

#[async_trait]
impl ReadinessProbe for AppState {
    fn service_name(&self) -> &'static str {
        "serialization"
    }

    async fn components(&self) -> Vec<(String, ComponentStatus)> {
        let store = match self.allocator().store().health_check().await {
            Ok(()) => ComponentStatus::ok(),
            Err(e) => ComponentStatus::unavailable(e.to_string()),
        };
        vec![("store".to_string(), store)]
    }
}
