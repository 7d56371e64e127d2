//! # Permit Form
//!
//! A permit authorizes a single display event. The applicant (permittee) and
//! the on-site controller are both required in full, except that when
//! `IsControllerSameAsPermittee` is set the controller section is not
//! validated and is filled from the applicant at submit time.

use chrono::NaiveDate;
use pyro_core::{EventType, PhoneNumber};
use serde::{Deserialize, Serialize};

use crate::age::validate_application_age;
use crate::details::{EventDetails, PermitDetails, Person};
use crate::fields::{join, require, Address, PersonDetails, ValidationErrors};

/// Event section of the permit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EventForm {
    pub event_date: Option<NaiveDate>,
    pub rain_date: Option<NaiveDate>,
    pub location: Address,
    pub description: String,
}

/// Permit application as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PermitForm {
    pub applicant: PersonDetails,
    pub event_type: Option<EventType>,
    pub event: EventForm,
    pub is_controller_same_as_permittee: bool,
    pub controller_details: PersonDetails,
    pub display_operator_license_number: String,
}

impl PermitForm {
    /// Every field error in the form.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.applicant.validate("Applicant", &mut errors);

        if self.event_type.is_none() {
            errors.push("EventType", "Event type is required");
        }
        match (self.event.event_date, self.event.rain_date) {
            (None, _) => errors.push("Event.EventDate", "Event date is required"),
            (Some(date), Some(rain)) if rain < date => {
                errors.push("Event.RainDate", "Rain date cannot be before the event date")
            }
            _ => {}
        }
        self.event.location.validate("Event.Location", &mut errors);

        if !self.is_controller_same_as_permittee {
            self.controller_details
                .validate("ControllerDetails", &mut errors);
        }
        require(
            &mut errors,
            "DisplayOperatorLicenseNumber".to_string(),
            &self.display_operator_license_number,
            "Display operator license number",
        );
        errors.into_result()
    }

    /// The controller that will be submitted: the applicant when mirrored.
    pub fn resolved_controller(&self) -> &PersonDetails {
        if self.is_controller_same_as_permittee {
            &self.applicant
        } else {
            &self.controller_details
        }
    }

    /// Validate, then build the normalized payload.
    pub fn into_details(self) -> Result<PermitDetails, ValidationErrors> {
        self.validate()?;
        let mut errors = ValidationErrors::new();
        let applicant = to_person(&self.applicant, "Applicant", &mut errors);
        let controller = to_person(self.resolved_controller(), "ControllerDetails", &mut errors);
        match (applicant, controller, self.event_type, self.event.event_date) {
            (Some(applicant), Some(controller_details), Some(event_type), Some(event_date)) => {
                Ok(PermitDetails {
                    applicant,
                    event_type,
                    event: EventDetails {
                        event_date,
                        rain_date: self.event.rain_date,
                        location: self.event.location,
                        description: self.event.description.trim().to_string(),
                    },
                    is_controller_same_as_permittee: self.is_controller_same_as_permittee,
                    controller_details,
                    display_operator_license_number: self
                        .display_operator_license_number
                        .trim()
                        .to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Normalize an already validated person. Records an error on the rare path
/// where normalization still fails.
pub(crate) fn to_person(
    details: &PersonDetails,
    prefix: &str,
    errors: &mut ValidationErrors,
) -> Option<Person> {
    let phone = PhoneNumber::parse(&details.phone_number)
        .map_err(|e| errors.push(join(prefix, "PhoneNumber"), e.to_string()))
        .ok();
    let age = validate_application_age(&details.age)
        .map_err(|e| errors.push(join(prefix, "Age"), e.to_string()))
        .ok();
    Some(Person {
        first_name: details.first_name.trim().to_string(),
        last_name: details.last_name.trim().to_string(),
        phone_number: phone?,
        address: details.address.clone(),
        age: age?,
    })
}
