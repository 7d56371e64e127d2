//! # Temporal Types: UTC Timestamps
//!
//! Server-stamped instants (`SubmissionTime`, `LastModifiedTime`,
//! `InspectionTime`) are carried as [`Timestamp`]: UTC, truncated to whole
//! seconds. The backend may emit any RFC 3339 offset; parsing converts to
//! UTC so two timestamps for the same instant compare equal.
//!
//! Calendar dates (`StartDate`, `ExpirationDate`) are plain
//! [`chrono::NaiveDate`] values and do not go through this type.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC instant with seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The UTC calendar date of this instant.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
