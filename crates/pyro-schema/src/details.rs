//! # Application Details DTOs
//!
//! Normalized, type-specific payloads sent to the backend once a form has
//! passed validation. Each shape is a tagged union so a permit can never
//! carry license fields and vice versa:
//!
//! ```text
//! ApplicationDetails ─┬─ Permit(PermitDetails)
//!                     └─ License(LicenseDetails)
//!                              └─ Applicant: LicenseApplicant ─┬─ Individual(Person)
//!                                                              └─ Business(BusinessApplicant)
//!                                                                    └─ Entity: BusinessEntity
//! ```
//!
//! Phones are digits-only ([`PhoneNumber`]) and ages are numbers here;
//! the form types in [`crate::permit`] and [`crate::license`] keep what the
//! user typed.

use chrono::NaiveDate;
use pyro_core::{ApplicationType, EntityType, EventType, LicenseType, PhoneNumber};
use serde::{Deserialize, Serialize};

use crate::fields::Address;

/// A validated person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: PhoneNumber,
    pub address: Address,
    pub age: u32,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Where and when a display takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventDetails {
    pub event_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_date: Option<NaiveDate>,
    pub location: Address,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermitDetails {
    pub applicant: Person,
    pub event_type: EventType,
    pub event: EventDetails,
    pub is_controller_same_as_permittee: bool,
    /// Always populated; a copy of the applicant when mirrored.
    pub controller_details: Person,
    pub display_operator_license_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityDetails {
    pub entity_name: String,
    /// Federal employer identification number, when the entity has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fein: Option<String>,
}

/// Business structure, keyed by `EntityType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "EntityType")]
pub enum BusinessEntity {
    #[serde(rename = "sole_proprietorship")]
    SoleProprietorship {
        #[serde(rename = "EntityDetails")]
        details: EntityDetails,
    },
    #[serde(rename = "partnership")]
    Partnership {
        #[serde(rename = "EntityDetails")]
        details: EntityDetails,
        /// Never empty.
        #[serde(rename = "Partners")]
        partners: Vec<Person>,
    },
    #[serde(rename = "corporation")]
    Corporation {
        #[serde(rename = "EntityDetails")]
        details: EntityDetails,
        /// Never empty.
        #[serde(rename = "Officers")]
        officers: Vec<Person>,
    },
    #[serde(rename = "llc")]
    LimitedLiabilityCompany {
        #[serde(rename = "EntityDetails")]
        details: EntityDetails,
        #[serde(rename = "Members", default)]
        members: Vec<Person>,
    },
}

impl BusinessEntity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::SoleProprietorship { .. } => EntityType::SoleProprietorship,
            Self::Partnership { .. } => EntityType::Partnership,
            Self::Corporation { .. } => EntityType::Corporation,
            Self::LimitedLiabilityCompany { .. } => EntityType::LimitedLiabilityCompany,
        }
    }

    pub fn details(&self) -> &EntityDetails {
        match self {
            Self::SoleProprietorship { details }
            | Self::Partnership { details, .. }
            | Self::Corporation { details, .. }
            | Self::LimitedLiabilityCompany { details, .. } => details,
        }
    }

    /// Partners, officers or members; empty for sole proprietorships.
    pub fn principals(&self) -> &[Person] {
        match self {
            Self::SoleProprietorship { .. } => &[],
            Self::Partnership { partners, .. } => partners,
            Self::Corporation { officers, .. } => officers,
            Self::LimitedLiabilityCompany { members, .. } => members,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusinessApplicant {
    /// The person filing on the entity's behalf.
    pub contact: Person,
    pub entity: BusinessEntity,
}

/// Who holds the license, keyed by `ApplicantType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ApplicantType")]
pub enum LicenseApplicant {
    #[serde(rename = "individual")]
    Individual(Person),
    #[serde(rename = "business")]
    Business(BusinessApplicant),
}

impl LicenseApplicant {
    /// The individual or the business contact.
    pub fn contact(&self) -> &Person {
        match self {
            Self::Individual(person) => person,
            Self::Business(business) => &business.contact,
        }
    }

    pub fn entity(&self) -> Option<&BusinessEntity> {
        match self {
            Self::Individual(_) => None,
            Self::Business(business) => Some(&business.entity),
        }
    }
}

/// Physical site declared by storage, wholesale and retail licensees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteDetails {
    pub site_business_name: String,
    pub site_phone_number: PhoneNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LicenseDetails {
    pub license_type: LicenseType,
    pub applicant: LicenseApplicant,
    /// `None` exactly when the license type is `importer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteDetails>,
}

/// Type-specific details of a submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ApplicationType")]
pub enum ApplicationDetails {
    #[serde(rename = "permit")]
    Permit(PermitDetails),
    #[serde(rename = "license")]
    License(LicenseDetails),
}

impl ApplicationDetails {
    pub fn application_type(&self) -> ApplicationType {
        match self {
            Self::Permit(_) => ApplicationType::Permit,
            Self::License(_) => ApplicationType::License,
        }
    }

    pub fn license_type(&self) -> Option<LicenseType> {
        match self {
            Self::Permit(_) => None,
            Self::License(license) => Some(license.license_type),
        }
    }

    /// County that scopes which inspectors see the application: the event
    /// location for permits, the site (or else the applicant) for licenses.
    pub fn county(&self) -> Option<&str> {
        let county = match self {
            Self::Permit(permit) => permit.event.location.county.as_deref(),
            Self::License(license) => license
                .site
                .as_ref()
                .and_then(|s| s.site_address.as_ref())
                .and_then(|a| a.county.as_deref())
                .or(license.applicant.contact().address.county.as_deref()),
        };
        county.filter(|c| !c.trim().is_empty())
    }

    /// Display name of the applicant or licensee.
    pub fn applicant_name(&self) -> String {
        match self {
            Self::Permit(permit) => permit.applicant.full_name(),
            Self::License(license) => match &license.applicant {
                LicenseApplicant::Individual(person) => person.full_name(),
                LicenseApplicant::Business(business) => {
                    business.entity.details().entity_name.clone()
                }
            },
        }
    }
}
