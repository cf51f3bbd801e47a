//! Label payload codec.
//!
//! A label payload is the text a renderer turns into a scannable code. It is a
//! pure function of the serial: the GS1 serial application identifier `(21)`
//! followed by the serial itself. Product, batch and dates are deliberately
//! left out to keep printed codes short.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{IdError, Serial};

/// Longest label payload accepted from callers.
pub const MAX_LABEL_LEN: usize = 100;

const SERIAL_AI: &str = "(21)";
const SERIAL_AI_BARE: &str = "21";

/// Text encoded into a printed label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelPayload(String);

impl LabelPayload {
    /// Derives the payload for a serial.
    #[must_use]
    pub fn for_serial(serial: &Serial) -> Self {
        Self(format!("{SERIAL_AI}{serial}"))
    }

    /// Wraps caller-supplied payload text after checking its length.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        let len = s.chars().count();
        if len > MAX_LABEL_LEN {
            return Err(IdError::TooLong {
                max: MAX_LABEL_LEN,
                actual: len,
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Wraps a payload read back from storage without re-checking it.
    #[must_use]
    pub fn from_trusted(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the payload text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the serial carried by the payload.
    ///
    /// Accepts `(21)SERIAL`, where the serial runs until the next `(` or the
    /// end, and the unbracketed scanner form `21SERIAL`.
    pub fn serial(&self) -> Result<Serial, IdError> {
        let raw = if let Some(start) = self.0.find(SERIAL_AI) {
            let rest = &self.0[start + SERIAL_AI.len()..];
            rest.split('(').next().unwrap_or_default()
        } else if let Some(rest) = self.0.strip_prefix(SERIAL_AI_BARE) {
            rest
        } else {
            return Err(IdError::UnrecognizedLabel(self.0.clone()));
        };

        if raw.is_empty() {
            return Err(IdError::UnrecognizedLabel(self.0.clone()));
        }
        Serial::parse(raw)
    }
}

impl fmt::Display for LabelPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
