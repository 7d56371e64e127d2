//! # Identifier Newtypes
//!
//! Server-assigned identifiers. Both are opaque strings; the only local
//! invariant is that they are non-blank. Deserialization routes through the
//! validating constructor so a blank id in a response is rejected instead
//! of silently accepted.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Identifier of a permit or license application.
///
/// Assigned by the backend on the first save (draft or submit).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl_validating_deserialize!(ApplicationId);

impl ApplicationId {
    /// Wrap a server-issued id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentifier`] for blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier {
                kind: "application id",
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ApplicationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identifier of a portal account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl_validating_deserialize!(UserId);

impl UserId {
    /// Wrap an identity-provider subject id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentifier`] for blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier { kind: "user id" });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
