//! Domain errors and their HTTP representation.
//!
//! [`ServiceError`] is what components return. [`ApiError`] is what handlers
//! return; it carries the HTTP status and a JSON body of the form:
//!
//! ```json
//! {"error": "Serial 10000002 does not exist", "kind": "validation_error",
//!  "title": "Bad Request", "requestId": "req_01HV..."}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    Conflict,
    InvalidTransition,
    UpstreamError,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// HTTP status used when this kind crosses an HTTP boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::ValidationError | ErrorKind::InvalidTransition => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors returned by unitrace components.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed or missing input. Always the caller's fault, never retried.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// The referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint rejected an insert.
    #[error("{0}")]
    Conflict(String),

    /// The requested status change is not in the transition table.
    #[error("Invalid status transition from {current} to {requested}. Valid transitions are: GENERATED -> PRINTED -> SCANNED")]
    InvalidTransition { current: String, requested: String },

    /// A dependency could not be reached or gave no usable answer.
    #[error("{0}")]
    Upstream(String),

    /// Unexpected failure with no more specific classification.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation { .. } => ErrorKind::ValidationError,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            ServiceError::Upstream(_) => ErrorKind::UpstreamError,
            ServiceError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    /// Operation-specific fields merged into the top-level object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ErrorBody {
    fn new(status: StatusCode, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: kind.into(),
            title: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            request_id: None,
            details: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Box<ErrorBody>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Box::new(ErrorBody::new(status, kind, message)),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::ValidationError.as_str(),
            message,
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorKind::NotFound.as_str(), message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InternalError.as_str(),
            message,
        )
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.body.request_id = Some(request_id.into());
        self
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.body.details = Some(details);
        self
    }

    /// Adds a top-level field to the error body.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.body.kind
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let api = ApiError::new(kind.status_code(), kind.as_str(), message.clone());
        match err {
            ServiceError::Validation { field, .. } => {
                api.with_details(vec![FieldError { field, message }])
            }
            _ => api,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
