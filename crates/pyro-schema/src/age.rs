//! # Age Validators
//!
//! Two validators with different bounds exist side by side:
//!
//! - [`validate_application_age`]: `21..=130`, applied to every person on
//!   a permit or license form.
//! - [`validate_age`]: strictly greater than 18 and strictly less than 130,
//!   the general-purpose check used for account profiles.
//!
//! The bounds disagree at 19, 20 and 130. Which one reflects the business
//! rule is unresolved, so neither is derived from the other.

use thiserror::Error;

pub const APPLICATION_MIN_AGE: u32 = 21;
pub const APPLICATION_MAX_AGE: u32 = 130;

pub const GENERAL_AGE_ABOVE: u32 = 18;
pub const GENERAL_AGE_BELOW: u32 = 130;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgeError {
    #[error("Age is required")]
    Missing,

    #[error("Age must be a whole number")]
    NotANumber,

    #[error("Age must be between {min} and {max}")]
    OutOfRange { min: u32, max: u32 },

    #[error("Age must be greater than {above} and less than {below}")]
    OutOfExclusiveRange { above: u32, below: u32 },
}

fn parse_age(input: &str) -> Result<u32, AgeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AgeError::Missing);
    }
    trimmed.parse::<u32>().map_err(|_| AgeError::NotANumber)
}

/// Application-form age check, inclusive bounds `21..=130`.
pub fn validate_application_age(input: &str) -> Result<u32, AgeError> {
    let age = parse_age(input)?;
    if (APPLICATION_MIN_AGE..=APPLICATION_MAX_AGE).contains(&age) {
        Ok(age)
    } else {
        Err(AgeError::OutOfRange {
            min: APPLICATION_MIN_AGE,
            max: APPLICATION_MAX_AGE,
        })
    }
}

/// General-purpose age check, exclusive bounds `18 < age < 130`.
pub fn validate_age(input: &str) -> Result<u32, AgeError> {
    let age = parse_age(input)?;
    if age > GENERAL_AGE_ABOVE && age < GENERAL_AGE_BELOW {
        Ok(age)
    } else {
        Err(AgeError::OutOfExclusiveRange {
            above: GENERAL_AGE_ABOVE,
            below: GENERAL_AGE_BELOW,
        })
    }
}
