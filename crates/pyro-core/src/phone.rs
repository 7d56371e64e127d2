//! # Phone Numbers
//!
//! U.S. ten-digit numbers. The wire form is digits only (`1234567890`); the
//! display form is `(123) 456-7890`. Anything past the tenth digit is
//! truncated, matching what an input mask does while the user types.
//!
//! [`format_phone`] is progressive: partial input renders as far as it goes
//! (`"1234"` → `"(123) 4"`), so it can be applied on every keystroke.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Digits in a complete U.S. phone number.
pub const PHONE_DIGITS: usize = 10;

/// Strip everything but ASCII digits and truncate to [`PHONE_DIGITS`].
pub fn unformat_phone(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_DIGITS)
        .collect()
}

/// Render input as `(XXX) XXX-XXXX`, progressively for partial input.
pub fn format_phone(input: &str) -> String {
    let digits = unformat_phone(input);
    let len = digits.len();
    match len {
        0 => String::new(),
        1..=3 => format!("({digits}"),
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// Whether `input` is exactly in display form `(XXX) XXX-XXXX`.
pub fn is_display_format(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != 14 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        0 => *b == b'(',
        4 => *b == b')',
        5 => *b == b' ',
        9 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}

/// A complete, normalized phone number (exactly ten digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize any input (formatted or not) into a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPhone`] when fewer than ten digits
    /// remain after normalization.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let digits = unformat_phone(input);
        if digits.len() != PHONE_DIGITS {
            return Err(ValidationError::InvalidPhone {
                expected: PHONE_DIGITS,
                actual: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Wire form: ten digits.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Display form: `(XXX) XXX-XXXX`.
    pub fn formatted(&self) -> String {
        format_phone(&self.0)
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted())
    }
}
