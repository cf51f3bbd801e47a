//! Error types for identifier parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier string is empty.
    #[error("identifier cannot be empty")]
    Empty,

    /// The identifier exceeds its length bound.
    #[error("identifier is too long: {actual} characters (max {max})")]
    TooLong { max: usize, actual: usize },

    /// The identifier contains a character outside its allowed set.
    #[error("identifier contains invalid character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    /// The ID has an invalid prefix.
    #[error("invalid ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ID is missing the underscore separator.
    #[error("ID missing underscore separator")]
    MissingSeparator,

    /// The ULID portion of the ID is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),

    /// A label payload does not carry a serial.
    #[error("label payload does not carry a serial: {0}")]
    UnrecognizedLabel(String),
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if the input broke a length or character-set rule.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            IdError::TooLong { .. } | IdError::InvalidCharacter { .. }
        )
    }
}
