//! Unit serials and container identifiers.

use crate::{define_token, IdError};

/// Longest accepted serial or container id.
pub const MAX_TOKEN_LEN: usize = 50;

/// First serial number handed out by an empty store.
pub const SERIAL_BASE: u64 = 10_000_001;

fn check_len(s: &str) -> Result<(), IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    let len = s.chars().count();
    if len > MAX_TOKEN_LEN {
        return Err(IdError::TooLong {
            max: MAX_TOKEN_LEN,
            actual: len,
        });
    }
    Ok(())
}

fn check_serial(s: &str) -> Result<(), IdError> {
    check_len(s)?;
    match s
        .chars()
        .enumerate()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some((position, ch)) => Err(IdError::InvalidCharacter { ch, position }),
        None => Ok(()),
    }
}

define_token!(
    /// Serial of one manufactured unit: 1..=50 characters of `[A-Za-z0-9_-]`.
    Serial,
    check_serial
);

define_token!(
    /// Caller-chosen container name: 1..=50 characters, any text.
    ContainerId,
    check_len
);

impl Serial {
    /// Renders an allocated serial number.
    #[must_use]
    pub fn from_number(n: u64) -> Self {
        Self(n.to_string())
    }

    /// Numeric value of the serial, ignoring any non-digit characters.
    ///
    /// Returns `None` when there are no digits or the value overflows `u64`.
    #[must_use]
    pub fn numeric_value(&self) -> Option<u64> {
        let digits: String = self.0.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_serial_accepts_allowed_charset() {
        let serial = Serial::parse("SN-0001_a").unwrap();
        assert_eq!(serial.as_str(), "SN-0001_a");
    }

    #[test]
    fn test_serial_rejects_bad_character() {
        let err = Serial::parse("SN 0001").unwrap_err();
        assert_eq!(
            err,
            IdError::InvalidCharacter {
                ch: ' ',
                position: 2
            }
        );
    }

    #[test]
    fn test_serial_rejects_overlong() {
        let long = "1".repeat(MAX_TOKEN_LEN + 1);
        assert!(matches!(
            Serial::parse(&long).unwrap_err(),
            IdError::TooLong { max: 50, actual: 51 }
        ));
        assert!(Serial::parse(&"1".repeat(MAX_TOKEN_LEN)).is_ok());
    }

    #[test]
    fn test_serial_numeric_value() {
        assert_eq!(Serial::from_number(10000001).numeric_value(), Some(10000001));
        assert_eq!(Serial::from_trusted("SN-42").numeric_value(), Some(42));
        assert_eq!(Serial::from_trusted("abc").numeric_value(), None);
        assert_eq!(
            Serial::from_trusted("99999999999999999999999").numeric_value(),
            None
        );
    }

    #[test]
    fn test_container_id_allows_any_text() {
        assert!(ContainerId::parse("carton #7 / line B").is_ok());
        assert!(ContainerId::parse("").unwrap_err().is_empty());
        assert!(ContainerId::parse(&"x".repeat(51))
            .unwrap_err()
            .is_shape_error());
    }

    #[test]
    fn test_serial_deserialize_validates() {
        let ok: Serial = serde_json::from_str("\"10000001\"").unwrap();
        assert_eq!(ok, Serial::from_number(10000001));
        assert!(serde_json::from_str::<Serial>("\"bad serial\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_allocated_serials_parse(n in 0u64..u64::MAX) {
            let serial = Serial::from_number(n);
            prop_assert!(Serial::parse(serial.as_str()).is_ok());
            prop_assert_eq!(serial.numeric_value(), Some(n));
        }
    }
}
