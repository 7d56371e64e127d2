//! # pyro-render: Printable Permits and Licenses
//!
//! Pure functions from an application record to a fixed layout that
//! mirrors the paper form: checkboxes for every enumerated choice (filled
//! when selected) and sections that appear only for the entity, license,
//! or event type that needs them.
//!
//! ```text
//! Application ──render_permit / render_license──▶ Document ──to_markup(mode)──▶ String
//! ```

pub mod layout;
pub mod license;
pub mod permit;

pub use layout::{Document, Node, RenderMode};
pub use license::render_license;
pub use permit::render_permit;

use chrono::NaiveDate;
use pyro_client::Application;
use pyro_core::ApplicationId;
use pyro_schema::ApplicationDetails;
use pyro_state::ApplicationStatus;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    /// Drafts hold a partial form and have nothing to print.
    #[error("application {id} is {status} and has no submitted details to render")]
    NoDetails {
        id: ApplicationId,
        status: ApplicationStatus,
    },
}

/// Layout for whichever kind of application `application` is.
pub fn document(application: &Application) -> Result<Document, RenderError> {
    match &application.application_details {
        Some(ApplicationDetails::Permit(details)) => Ok(render_permit(application, details)),
        Some(ApplicationDetails::License(details)) => Ok(render_license(application, details)),
        None => Err(RenderError::NoDetails {
            id: application.application_id.clone(),
            status: application.status,
        }),
    }
}

/// Markup for `application` in `mode`.
pub fn render(application: &Application, mode: RenderMode) -> Result<String, RenderError> {
    Ok(document(application)?.to_markup(mode))
}

pub(crate) fn date_or_blank(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%m/%d/%Y").to_string())
        .unwrap_or_default()
}

pub(crate) fn header(application: &Application, number_label: &str) -> Node {
    Node::row(vec![
        Node::field(number_label, application.application_id.as_str()),
        Node::field("Status", application.status.as_str()),
        Node::field("Issued", date_or_blank(application.start_date)),
        Node::field("Expires", date_or_blank(application.expiration_date)),
    ])
}

pub(crate) fn signatures(application: &Application) -> Node {
    let mut children = vec![Node::row(vec![
        Node::signature("Applicant Signature", application.user_signature.as_deref()),
        Node::signature("Inspector Signature", application.inspector_signature.as_deref()),
    ])];
    if let Some(remarks) = &application.remarks {
        children.push(Node::field("Remarks", remarks.clone()));
    }
    Node::section("Signatures", children)
}
