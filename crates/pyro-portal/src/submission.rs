//! Form submission: validate → build the request DTO → create or update.
//!
//! Validation runs entirely before the network. A submission of an
//! existing record carries the `LastModifiedTime` it was loaded with, so a
//! concurrent change is answered with a conflict instead of being
//! overwritten.

use pyro_client::{Application, ApplicationWrite, ClientError, PortalClient};
use pyro_core::{Action, Role, Service};
use pyro_schema::{ApplicationForm, ValidationErrors};
use pyro_state::{
    can_edit, can_submit, ensure_editable, next_status, ApplicationStatus, PermissionTable,
    StatusError, Transition,
};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error("{role} may not submit applications")]
    NotPermitted { role: Role },
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SubmissionError {
    /// The record changed since it was loaded; reload before retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_conflict())
    }
}

/// Who is submitting.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext<'a> {
    pub client: &'a PortalClient,
    pub table: &'a PermissionTable,
    pub role: Role,
}

/// Validate and submit `form`.
///
/// Without `existing` a new application is created at `submitted`. A draft
/// or pending record is submitted in place; a submitted record is updated
/// and stays submitted.
pub async fn submit_application(
    ctx: SubmissionContext<'_>,
    form: ApplicationForm,
    existing: Option<&Application>,
    signature: Option<String>,
) -> Result<Application, SubmissionError> {
    let status = existing.map_or(ApplicationStatus::Draft, |a| a.status);
    let allowed = match status {
        ApplicationStatus::Submitted => can_edit(ctx.table, ctx.role, status),
        _ => can_submit(ctx.table, ctx.role, status),
    };
    if !allowed {
        ensure_editable(status)?;
        if status != ApplicationStatus::Submitted {
            next_status(status, Transition::Submit)?;
        }
        return Err(SubmissionError::NotPermitted { role: ctx.role });
    }

    let details = form.into_details()?;
    let mut body = ApplicationWrite::submission(details);
    if let Some(signature) = signature.filter(|s| !s.trim().is_empty()) {
        body = body.with_signature(signature);
    }

    let saved = match existing {
        None => ctx.client.applications().create(&body, false).await?,
        Some(app) => {
            let body = body.expecting(app.last_modified_time);
            ctx.client
                .applications()
                .update(&app.application_id, &body, false)
                .await?
        }
    };
    tracing::info!(
        application_id = %saved.application_id,
        status = %saved.status,
        "application submitted"
    );
    Ok(saved)
}

/// Save `form` as a draft without validating it.
///
/// Only drafts can be saved again as drafts.
pub async fn save_draft(
    ctx: SubmissionContext<'_>,
    form: ApplicationForm,
    existing: Option<&Application>,
) -> Result<Application, SubmissionError> {
    if !ctx
        .table
        .is_allowed(Service::Applications, ctx.role, Action::Create)
    {
        return Err(SubmissionError::NotPermitted { role: ctx.role });
    }
    let status = existing.map_or(ApplicationStatus::Draft, |a| a.status);
    next_status(status, Transition::SaveDraft)?;

    let body = ApplicationWrite::draft(form);
    let saved = match existing {
        None => ctx.client.applications().create(&body, true).await?,
        Some(app) => {
            let body = body.expecting(app.last_modified_time);
            ctx.client
                .applications()
                .update(&app.application_id, &body, true)
                .await?
        }
    };
    tracing::debug!(application_id = %saved.application_id, "draft saved");
    Ok(saved)
}
