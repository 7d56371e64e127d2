//! # License Form
//!
//! Conditional rules:
//!
//! - `ApplicantType = business` requires an `EntityType`, and every entity
//!   type requires `EntityDetails.EntityName`.
//! - A partnership needs at least one partner; a corporation at least one
//!   officer. Each listed principal is validated in full.
//! - `SiteBusinessName` and `SitePhoneNumber` are required for every license
//!   type except `importer`, which declares no site.
//!
//! Sections that do not apply to the chosen types are dropped when the
//! payload is built, so stale input never reaches the backend.

use pyro_core::{ApplicantType, EntityType, LicenseType, PhoneNumber};
use serde::{Deserialize, Serialize};

use crate::details::{
    BusinessApplicant, BusinessEntity, EntityDetails, LicenseApplicant, LicenseDetails, Person,
    SiteDetails,
};
use crate::fields::{require, require_display_phone, Address, PersonDetails, ValidationErrors};
use crate::permit::to_person;

pub const PARTNER_REQUIRED: &str = "At least one partner is required for partnerships";
pub const OFFICER_REQUIRED: &str = "At least one officer is required for corporations";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EntityDetailsForm {
    pub entity_name: String,
    pub fein: String,
}

/// License application as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LicenseForm {
    pub license_type: Option<LicenseType>,
    pub applicant_type: Option<ApplicantType>,
    /// The individual licensee, or the business contact.
    pub applicant: PersonDetails,
    pub entity_type: Option<EntityType>,
    pub entity_details: EntityDetailsForm,
    pub partners: Vec<PersonDetails>,
    pub officers: Vec<PersonDetails>,
    pub members: Vec<PersonDetails>,
    pub site_business_name: String,
    pub site_phone_number: String,
    pub site_address: Option<Address>,
}

fn validate_people(
    people: &[PersonDetails],
    field: &str,
    missing_message: Option<&str>,
    errors: &mut ValidationErrors,
) {
    if people.is_empty() {
        if let Some(message) = missing_message {
            errors.push(field, message);
        }
    }
    for (i, person) in people.iter().enumerate() {
        person.validate(&format!("{field}[{i}]"), errors);
    }
}

impl LicenseForm {
    /// Every field error in the form.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.license_type.is_none() {
            errors.push("LicenseType", "License type is required");
        }
        match self.applicant_type {
            None => errors.push("ApplicantType", "Applicant type is required"),
            Some(ApplicantType::Individual) => {}
            Some(ApplicantType::Business) => self.validate_entity(&mut errors),
        }
        self.applicant.validate("Applicant", &mut errors);

        if self.license_type.is_some_and(|t| t.requires_site()) {
            require(
                &mut errors,
                "SiteBusinessName".to_string(),
                &self.site_business_name,
                "Site business name",
            );
            require_display_phone(&mut errors, "SitePhoneNumber".to_string(), &self.site_phone_number);
            if let Some(address) = &self.site_address {
                address.validate("SiteAddress", &mut errors);
            }
        }
        errors.into_result()
    }

    fn validate_entity(&self, errors: &mut ValidationErrors) {
        let Some(entity_type) = self.entity_type else {
            errors.push("EntityType", "Entity type is required for business applicants");
            return;
        };
        require(
            errors,
            "EntityDetails.EntityName".to_string(),
            &self.entity_details.entity_name,
            "Entity name",
        );
        match entity_type {
            EntityType::Partnership => {
                validate_people(&self.partners, "Partners", Some(PARTNER_REQUIRED), errors)
            }
            EntityType::Corporation => {
                validate_people(&self.officers, "Officers", Some(OFFICER_REQUIRED), errors)
            }
            EntityType::LimitedLiabilityCompany => {
                validate_people(&self.members, "Members", None, errors)
            }
            EntityType::SoleProprietorship => {}
        }
    }

    /// Validate, then build the normalized payload.
    pub fn into_details(self) -> Result<LicenseDetails, ValidationErrors> {
        self.validate()?;
        let mut errors = ValidationErrors::new();

        let contact = to_person(&self.applicant, "Applicant", &mut errors);
        let applicant = match (self.applicant_type, contact) {
            (Some(ApplicantType::Individual), Some(person)) => {
                Some(LicenseApplicant::Individual(person))
            }
            (Some(ApplicantType::Business), Some(contact)) => self
                .build_entity(&mut errors)
                .map(|entity| LicenseApplicant::Business(BusinessApplicant { contact, entity })),
            _ => None,
        };

        let site = match self.license_type {
            Some(t) if t.requires_site() => {
                match PhoneNumber::parse(&self.site_phone_number) {
                    Ok(site_phone_number) => Some(Some(SiteDetails {
                        site_business_name: self.site_business_name.trim().to_string(),
                        site_phone_number,
                        site_address: self.site_address.clone(),
                    })),
                    Err(e) => {
                        errors.push("SitePhoneNumber", e.to_string());
                        None
                    }
                }
            }
            Some(_) => Some(None),
            None => None,
        };

        match (self.license_type, applicant, site) {
            (Some(license_type), Some(applicant), Some(site)) if errors.is_empty() => {
                Ok(LicenseDetails {
                    license_type,
                    applicant,
                    site,
                })
            }
            _ => Err(errors),
        }
    }

    fn build_entity(&self, errors: &mut ValidationErrors) -> Option<BusinessEntity> {
        let fein = self.entity_details.fein.trim();
        let details = EntityDetails {
            entity_name: self.entity_details.entity_name.trim().to_string(),
            fein: (!fein.is_empty()).then(|| fein.to_string()),
        };
        let people = |list: &[PersonDetails], field: &str, errors: &mut ValidationErrors| {
            list.iter()
                .enumerate()
                .map(|(i, p)| to_person(p, &format!("{field}[{i}]"), errors))
                .collect::<Option<Vec<Person>>>()
        };
        let entity = match self.entity_type? {
            EntityType::SoleProprietorship => BusinessEntity::SoleProprietorship { details },
            EntityType::Partnership => BusinessEntity::Partnership {
                details,
                partners: people(&self.partners, "Partners", errors)?,
            },
            EntityType::Corporation => BusinessEntity::Corporation {
                details,
                officers: people(&self.officers, "Officers", errors)?,
            },
            EntityType::LimitedLiabilityCompany => BusinessEntity::LimitedLiabilityCompany {
                details,
                members: people(&self.members, "Members", errors)?,
            },
        };
        Some(entity)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fields::tests::person;

    pub(crate) fn retail_individual() -> LicenseForm {
        LicenseForm {
            license_type: Some(LicenseType::Retail),
            applicant_type: Some(ApplicantType::Individual),
            applicant: person("Cara"),
            site_business_name: "Cara's Sparklers".into(),
            site_phone_number: "(302) 555-0199".into(),
            ..Default::default()
        }
    }

    fn business(entity_type: EntityType) -> LicenseForm {
        LicenseForm {
            applicant_type: Some(ApplicantType::Business),
            entity_type: Some(entity_type),
            entity_details: EntityDetailsForm {
                entity_name: "Skyburst LLC".into(),
                fein: "12-3456789".into(),
            },
            ..retail_individual()
        }
    }

    #[test]
    fn test_individual_retail_license_validates() {
        let details = retail_individual().into_details().unwrap();
        assert!(matches!(details.applicant, LicenseApplicant::Individual(_)));
        assert_eq!(details.site.unwrap().site_phone_number.digits(), "3025550199");
    }

    #[test]
    fn test_partnership_without_partners_fails() {
        let errors = business(EntityType::Partnership).validate().unwrap_err();
        assert_eq!(errors.message_for("Partners"), Some(PARTNER_REQUIRED));
        assert_eq!(
            errors.message_for("Partners"),
            Some("At least one partner is required for partnerships")
        );
    }

    #[test]
    fn test_corporation_without_officers_fails() {
        let errors = business(EntityType::Corporation).validate().unwrap_err();
        assert_eq!(
            errors.message_for("Officers"),
            Some("At least one officer is required for corporations")
        );
    }

    #[test]
    fn test_partners_are_validated_individually() {
        let mut form = business(EntityType::Partnership);
        let mut partner = person("Dev");
        partner.age = "131".into();
        form.partners = vec![person("Eli"), partner];
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.message_for("Partners[1].Age"),
            Some("Age must be between 21 and 130")
        );
    }

    #[test]
    fn test_business_requires_entity_type_and_name() {
        let mut form = business(EntityType::SoleProprietorship);
        form.entity_type = None;
        let errors = form.validate().unwrap_err();
        assert!(errors.message_for("EntityType").is_some());

        let mut form = business(EntityType::LimitedLiabilityCompany);
        form.entity_details.entity_name = " ".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.message_for("EntityDetails.EntityName"),
            Some("Entity name is required")
        );
    }

    #[test]
    fn test_site_required_except_importer() {
        for license_type in [LicenseType::Storage, LicenseType::Wholesale, LicenseType::Retail] {
            let mut form = retail_individual();
            form.license_type = Some(license_type);
            form.site_business_name.clear();
            form.site_phone_number.clear();
            let errors = form.validate().unwrap_err();
            assert!(errors.message_for("SiteBusinessName").is_some());
            assert!(errors.message_for("SitePhoneNumber").is_some());
        }

        let mut form = retail_individual();
        form.license_type = Some(LicenseType::Importer);
        form.site_business_name.clear();
        form.site_phone_number.clear();
        let details = form.into_details().unwrap();
        assert!(details.site.is_none());
    }

    #[test]
    fn test_importer_drops_stale_site_input() {
        let mut form = retail_individual();
        form.license_type = Some(LicenseType::Importer);
        let details = form.into_details().unwrap();
        assert!(details.site.is_none());
    }

    #[test]
    fn test_partnership_builds_tagged_payload() {
        let mut form = business(EntityType::Partnership);
        form.partners = vec![person("Eli")];
        form.officers = vec![person("Ignored")];
        let details = form.into_details().unwrap();

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["Applicant"]["ApplicantType"], "business");
        assert_eq!(json["Applicant"]["Entity"]["EntityType"], "partnership");
        assert_eq!(json["Applicant"]["Entity"]["EntityDetails"]["EntityName"], "Skyburst LLC");
        assert_eq!(json["Applicant"]["Entity"]["Partners"][0]["FirstName"], "Eli");
        assert!(json["Applicant"]["Entity"].get("Officers").is_none());

        let parsed: LicenseDetails = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, details);
    }
}
