//! Unit lifecycle: GENERATED → PRINTED → SCANNED.
//!
//! The status of an identifier only ever moves one step forward. SCANNED is
//! terminal. Same-state, reverse, and skipping transitions are rejected.
//!
//! Records written before this table existed may carry a status outside it.
//! Those are kept verbatim as [`StoredStatus::Legacy`] and any requested
//! status is accepted for them, so old data never hard-fails.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use unitrace_service::ServiceError;

/// A lifecycle status this service knows how to transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Generated,
    Printed,
    Scanned,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Generated, Status::Printed, Status::Scanned];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Generated => "GENERATED",
            Status::Printed => "PRINTED",
            Status::Scanned => "SCANNED",
        }
    }

    /// The single status reachable from this one, if any.
    pub fn successor(&self) -> Option<Status> {
        match self {
            Status::Generated => Some(Status::Printed),
            Status::Printed => Some(Status::Scanned),
            Status::Scanned => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.successor().is_none()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; surrounding whitespace is ignored.
impl FromStr for Status {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| {
                ServiceError::validation(
                    "status",
                    "Invalid status. Must be one of: GENERATED, PRINTED, SCANNED",
                )
            })
    }
}

/// A status as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoredStatus {
    Known(Status),
    Legacy(String),
}

impl StoredStatus {
    /// Interprets a raw stored value, keeping unknown values verbatim.
    pub fn from_stored(raw: &str) -> Self {
        match raw.parse::<Status>() {
            Ok(status) => StoredStatus::Known(status),
            Err(_) => StoredStatus::Legacy(raw.to_string()),
        }
    }

    /// The value persisted for this status.
    pub fn as_str(&self) -> &str {
        match self {
            StoredStatus::Known(status) => status.as_str(),
            StoredStatus::Legacy(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<Status> {
        match self {
            StoredStatus::Known(status) => Some(*status),
            StoredStatus::Legacy(_) => None,
        }
    }
}

impl From<Status> for StoredStatus {
    fn from(status: Status) -> Self {
        StoredStatus::Known(status)
    }
}

impl fmt::Display for StoredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StoredStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Checks `current → requested` against the transition table.
pub fn check_transition(current: &StoredStatus, requested: Status) -> Result<(), ServiceError> {
    match current {
        StoredStatus::Known(status) if status.successor() == Some(requested) => Ok(()),
        StoredStatus::Known(status) => Err(ServiceError::InvalidTransition {
            current: status.to_string(),
            requested: requested.to_string(),
        }),
        StoredStatus::Legacy(raw) => {
            tracing::warn!(
                current = %raw,
                requested = %requested,
                "Accepting transition from unrecognised legacy status"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Status::Generated, Status::Printed)]
    #[case(Status::Printed, Status::Scanned)]
    fn test_forward_steps_allowed(#[case] from: Status, #[case] to: Status) {
        assert!(check_transition(&from.into(), to).is_ok());
    }

    #[rstest]
    #[case(Status::Generated, Status::Generated)]
    #[case(Status::Generated, Status::Scanned)]
    #[case(Status::Printed, Status::Printed)]
    #[case(Status::Printed, Status::Generated)]
    #[case(Status::Scanned, Status::Scanned)]
    #[case(Status::Scanned, Status::Printed)]
    #[case(Status::Scanned, Status::Generated)]
    fn test_other_pairs_rejected(#[case] from: Status, #[case] to: Status) {
        let err = check_transition(&from.into(), to).unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidTransition {
                current: from.to_string(),
                requested: to.to_string(),
            }
        );
    }

    #[test]
    fn test_legacy_status_accepts_anything() {
        let legacy = StoredStatus::from_stored("SHIPPED");
        assert_eq!(legacy, StoredStatus::Legacy("SHIPPED".to_string()));
        for status in Status::ALL {
            assert!(check_transition(&legacy, status).is_ok());
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("printed".parse::<Status>().unwrap(), Status::Printed);
        assert_eq!(" Scanned ".parse::<Status>().unwrap(), Status::Scanned);
        assert!(matches!(
            "LOST".parse::<Status>().unwrap_err(),
            ServiceError::Validation { .. }
        ));
    }

    #[test]
    fn test_stored_lowercase_status_is_known() {
        assert_eq!(
            StoredStatus::from_stored("printed"),
            StoredStatus::Known(Status::Printed)
        );
    }

    #[test]
    fn test_only_scanned_is_terminal() {
        assert!(Status::Scanned.is_terminal());
        assert!(!Status::Generated.is_terminal());
        assert!(!Status::Printed.is_terminal());
    }
}
