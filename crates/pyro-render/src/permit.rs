//! Fireworks display permit.

use pyro_client::Application;
use pyro_core::EventType;
use pyro_schema::{PermitDetails, Person};

use crate::layout::{Document, Node};
use crate::{date_or_blank, header, signatures};

fn event_type_label(event_type: EventType) -> &'static str {
    match event_type {
        EventType::PublicDisplay => "Public Display",
        EventType::PrivateDisplay => "Private Display",
        EventType::Proximate => "Proximate Pyrotechnics",
    }
}

pub(crate) fn person_fields(person: &Person) -> Vec<Node> {
    vec![
        Node::row(vec![
            Node::field("Name", person.full_name()),
            Node::field("Age", person.age.to_string()),
        ]),
        Node::field("Address", person.address.one_line()),
        Node::field("Phone", person.phone_number.formatted()),
    ]
}

/// Layout of a permit for `application` with `details`.
pub fn render_permit(application: &Application, details: &PermitDetails) -> Document {
    let mut doc = Document::new("Fireworks Display Permit");
    doc.push(header(application, "Permit No."));

    doc.push(Node::section("Permittee", person_fields(&details.applicant)));

    let mut event = vec![Node::row(
        EventType::ALL
            .iter()
            .map(|t| Node::checkbox(event_type_label(*t), *t == details.event_type))
            .collect(),
    )];
    event.push(Node::row(vec![
        Node::field("Event Date", details.event.event_date.format("%m/%d/%Y").to_string()),
        Node::field("Rain Date", date_or_blank(details.event.rain_date)),
    ]));
    event.push(Node::field("Location", details.event.location.one_line()));
    if let Some(county) = &details.event.location.county {
        event.push(Node::field("County", county.clone()));
    }
    if !details.event.description.is_empty() {
        event.push(Node::field("Description", details.event.description.clone()));
    }
    doc.push(Node::section("Event", event));

    let mut controller = vec![Node::checkbox(
        "Controller is the permittee",
        details.is_controller_same_as_permittee,
    )];
    controller.extend(person_fields(&details.controller_details));
    controller.push(Node::field(
        "Display Operator License No.",
        details.display_operator_license_number.clone(),
    ));
    doc.push(Node::section("Controller", controller));

    doc.push(signatures(application));
    doc
}
