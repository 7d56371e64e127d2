//! Fireworks importer / storage / wholesale / retail license.

use pyro_client::Application;
use pyro_core::{ApplicantType, EntityType, LicenseType};
use pyro_schema::{BusinessEntity, LicenseApplicant, LicenseDetails};

use crate::layout::{Document, Node};
use crate::permit::person_fields;
use crate::{header, signatures};

fn license_type_label(license_type: LicenseType) -> &'static str {
    match license_type {
        LicenseType::Importer => "Importer",
        LicenseType::Storage => "Storage",
        LicenseType::Wholesale => "Wholesale",
        LicenseType::Retail => "Retail",
    }
}

fn entity_type_label(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::SoleProprietorship => "Sole Proprietorship",
        EntityType::Partnership => "Partnership",
        EntityType::Corporation => "Corporation",
        EntityType::LimitedLiabilityCompany => "LLC",
    }
}

fn principals_section(entity: &BusinessEntity) -> Option<Node> {
    let (title, label) = match entity {
        BusinessEntity::SoleProprietorship { .. } => return None,
        BusinessEntity::Partnership { .. } => ("Partners", "Partner"),
        BusinessEntity::Corporation { .. } => ("Officers", "Officer"),
        BusinessEntity::LimitedLiabilityCompany { .. } => ("Members", "Member"),
    };
    let principals = entity.principals();
    if principals.is_empty() {
        return None;
    }
    let children = principals
        .iter()
        .enumerate()
        .map(|(i, person)| Node::section(format!("{label} {}", i + 1), person_fields(person)))
        .collect();
    Some(Node::section(title, children))
}

/// Layout of a license for `application` with `details`.
pub fn render_license(application: &Application, details: &LicenseDetails) -> Document {
    let mut doc = Document::new(format!(
        "Fireworks {} License",
        license_type_label(details.license_type)
    ));
    doc.push(header(application, "License No."));
    doc.push(Node::row(
        LicenseType::ALL
            .iter()
            .map(|t| Node::checkbox(license_type_label(*t), *t == details.license_type))
            .collect(),
    ));

    let applicant_type = match &details.applicant {
        LicenseApplicant::Individual(_) => ApplicantType::Individual,
        LicenseApplicant::Business(_) => ApplicantType::Business,
    };
    let mut applicant = vec![Node::row(vec![
        Node::checkbox("Individual", applicant_type == ApplicantType::Individual),
        Node::checkbox("Business", applicant_type == ApplicantType::Business),
    ])];
    applicant.extend(person_fields(details.applicant.contact()));
    doc.push(Node::section("Licensee", applicant));

    if let Some(entity) = details.applicant.entity() {
        let mut business = vec![Node::row(
            EntityType::ALL
                .iter()
                .map(|t| Node::checkbox(entity_type_label(*t), *t == entity.entity_type()))
                .collect(),
        )];
        business.push(Node::field("Entity Name", entity.details().entity_name.clone()));
        if let Some(fein) = &entity.details().fein {
            business.push(Node::field("FEIN", fein.clone()));
        }
        if let Some(section) = principals_section(entity) {
            business.push(section);
        }
        doc.push(Node::section("Business Entity", business));
    }

    if let Some(site) = details.site.as_ref().filter(|_| details.license_type.requires_site()) {
        let mut children = vec![
            Node::field("Business Name", site.site_business_name.clone()),
            Node::field("Phone", site.site_phone_number.formatted()),
        ];
        if let Some(address) = &site.site_address {
            children.push(Node::field("Address", address.one_line()));
        }
        doc.push(Node::section("Site", children));
    }

    doc.push(signatures(application));
    doc
}
