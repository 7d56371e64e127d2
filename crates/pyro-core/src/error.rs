//! # Error Types
//!
//! Construction-time validation failures for the core newtypes. Each
//! variant carries the offending value so the caller can echo it back to
//! the user without re-deriving it.

use thiserror::Error;

/// A value failed validation while constructing a core type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier was empty or only whitespace.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// Which identifier kind was being built.
        kind: &'static str,
    },

    /// A wire token did not match any known variant.
    #[error("unknown {kind}: {value:?}")]
    UnknownToken {
        /// The vocabulary the token was parsed against.
        kind: &'static str,
        /// The rejected token.
        value: String,
    },

    /// A phone number did not contain enough digits.
    #[error("phone number must contain {expected} digits, got {actual}")]
    InvalidPhone {
        /// Required digit count.
        expected: usize,
        /// Digits found after normalization.
        actual: usize,
    },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}
