//! Store error types.

use thiserror::Error;
use unitrace_service::ServiceError;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors from store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert hit the uniqueness constraint on the record's key.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A stored row could not be turned back into a record.
    #[error("corrupt row: {0}")]
    Decode(String),

    /// A sequence reached the largest value its column can hold.
    #[error("sequence exhausted: {0}")]
    Exhausted(String),
}

impl StoreError {
    /// Classifies an insert failure, turning a unique violation into
    /// [`StoreError::Duplicate`] for `key`.
    pub fn from_insert(err: sqlx::Error, key: &str) -> Self {
        if is_unique_violation(&err) {
            StoreError::Duplicate(key.to_string())
        } else {
            StoreError::Query(err)
        }
    }
}

/// Returns true if `err` is a Postgres unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Fallback mapping for store failures that the caller did not classify.
///
/// Call sites translate [`StoreError::Duplicate`] into a domain-specific
/// conflict message before reaching this; anything left is internal.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => ServiceError::Conflict(format!("{key} already exists")),
            other => {
                tracing::error!(error = %other, "Store operation failed");
                ServiceError::Internal("Storage operation failed".to_string())
            }
        }
    }
}

/// Database connection and migration errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to connect to the database.
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// Migration directory not found in the current environment.
    #[error("migration directory not found; tried {tried}. Last error: {last_error}")]
    MigrationDirNotFound { tried: String, last_error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err: ServiceError = StoreError::Duplicate("serial 10000001".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_decode_maps_to_internal() {
        let err: ServiceError = StoreError::Decode("bad date".into()).into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(matches!(
            StoreError::from_insert(sqlx::Error::RowNotFound, "x"),
            StoreError::Query(_)
        ));
    }
}
