//! # Shared Form Fields
//!
//! Building blocks used by both application forms, plus the field-level
//! error collection every validator appends to.
//!
//! Validators never stop at the first problem: they walk the whole form and
//! record one [`FieldError`] per offending field, keyed by a dotted path
//! (`ControllerDetails.Address.ZipCode`, `Partners[0].Age`) so a form can
//! render each message beneath its input.

use std::fmt;

use pyro_core::phone::is_display_format;
use serde::{Deserialize, Serialize};

use crate::age::validate_application_age;

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path to the field, using the wire field names.
    pub path: String,
    /// Message shown beneath the field.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {}", self.path, self.message)
    }
}

/// Every field error found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// The first message recorded for `path`, if any.
    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) failed validation", self.errors.len())?;
        for e in &self.errors {
            write!(f, "\n{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Join a parent path and a field name.
pub(crate) fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

pub(crate) fn require(errors: &mut ValidationErrors, path: String, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.push(path, format!("{label} is required"));
    }
}

pub(crate) fn require_display_phone(errors: &mut ValidationErrors, path: String, value: &str) {
    if value.trim().is_empty() {
        errors.push(path, "Phone number is required");
    } else if !is_display_format(value) {
        errors.push(path, "Phone number must be in the format (XXX) XXX-XXXX");
    }
}

/// Postal address as entered on a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    /// Jurisdiction used to scope inspectors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
}

impl Address {
    pub fn validate(&self, prefix: &str, errors: &mut ValidationErrors) {
        require(errors, join(prefix, "Street"), &self.street, "Street");
        require(errors, join(prefix, "City"), &self.city, "City");
        require(errors, join(prefix, "State"), &self.state, "State");
        if !is_zip_code(&self.zip_code) {
            errors.push(join(prefix, "ZipCode"), "Zip code must be 5 digits");
        }
    }

    /// Single-line rendering for summaries and printable artifacts.
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.street.trim(),
            self.city.trim(),
            self.state.trim(),
            self.zip_code.trim()
        )
    }
}

/// `12345` or `12345-6789`.
fn is_zip_code(s: &str) -> bool {
    let b = s.trim().as_bytes();
    match b.len() {
        5 => b.iter().all(u8::is_ascii_digit),
        10 => b[5] == b'-' && b[..5].iter().chain(&b[6..]).all(u8::is_ascii_digit),
        _ => false,
    }
}

/// A person as entered on a form: applicant, controller, partner, officer.
///
/// Phone and age stay as typed; [`crate::details::Person`] is the normalized
/// wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PersonDetails {
    pub first_name: String,
    pub last_name: String,
    /// Display form `(XXX) XXX-XXXX`.
    pub phone_number: String,
    pub address: Address,
    pub age: String,
}

impl PersonDetails {
    pub fn validate(&self, prefix: &str, errors: &mut ValidationErrors) {
        require(errors, join(prefix, "FirstName"), &self.first_name, "First name");
        require(errors, join(prefix, "LastName"), &self.last_name, "Last name");
        require_display_phone(errors, join(prefix, "PhoneNumber"), &self.phone_number);
        self.address.validate(&join(prefix, "Address"), errors);
        if let Err(e) = validate_application_age(&self.age) {
            errors.push(join(prefix, "Age"), e.to_string());
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}
