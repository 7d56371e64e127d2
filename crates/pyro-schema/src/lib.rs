//! # pyro-schema: Application Form Schemas
//!
//! Structural validation for the two application families, run before any
//! network call, and the typed payloads built from a valid form.
//!
//! ```text
//! PermitForm  ──validate──▶ into_details() ──▶ ApplicationDetails::Permit
//! LicenseForm ──validate──▶ into_details() ──▶ ApplicationDetails::License
//! ```
//!
//! Forms hold exactly what the user typed (display-format phones, ages as
//! text) and may be partial; drafts are saved in form shape. Details are
//! normalized and complete.
//!
//! Errors are field-level ([`FieldError`]) and collected in full per pass
//! ([`ValidationErrors`]) so every message can be shown under its input.

pub mod age;
pub mod details;
pub mod fields;
pub mod license;
pub mod permit;

use pyro_core::ApplicationType;
use serde::{Deserialize, Serialize};

pub use age::{validate_age, validate_application_age, AgeError};
pub use details::{
    ApplicationDetails, BusinessApplicant, BusinessEntity, EntityDetails, EventDetails,
    LicenseApplicant, LicenseDetails, PermitDetails, Person, SiteDetails,
};
pub use fields::{Address, FieldError, PersonDetails, ValidationErrors};
pub use license::{EntityDetailsForm, LicenseForm};
pub use permit::{EventForm, PermitForm};

/// Either form, keyed by `ApplicationType`. This is also the shape of a
/// saved draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ApplicationType")]
pub enum ApplicationForm {
    #[serde(rename = "permit")]
    Permit(PermitForm),
    #[serde(rename = "license")]
    License(LicenseForm),
}

impl ApplicationForm {
    pub fn application_type(&self) -> ApplicationType {
        match self {
            Self::Permit(_) => ApplicationType::Permit,
            Self::License(_) => ApplicationType::License,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Permit(form) => form.validate(),
            Self::License(form) => form.validate(),
        }
    }

    /// Validate and build the submission payload.
    pub fn into_details(self) -> Result<ApplicationDetails, ValidationErrors> {
        match self {
            Self::Permit(form) => form.into_details().map(ApplicationDetails::Permit),
            Self::License(form) => form.into_details().map(ApplicationDetails::License),
        }
    }
}
