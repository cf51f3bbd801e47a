//! Shared service plumbing for the unitrace services.
//!
//! Every service binary is built from the same pieces:
//! - [`error`]: the domain error taxonomy and its HTTP mapping
//! - [`request_context`]: per-request trace id extraction
//! - [`health`]: liveness and readiness endpoints
//! - [`telemetry`]: tracing subscriber setup
//! - [`server`]: the listen loop with graceful shutdown

pub mod error;
pub mod extract;
pub mod health;
pub mod request_context;
pub mod server;
pub mod telemetry;

pub use error::{ApiError, ErrorKind, FieldError, ServiceError};
pub use extract::ApiJson;
pub use health::{ComponentStatus, ReadinessProbe};
pub use request_context::RequestContext;
