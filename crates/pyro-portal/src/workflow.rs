//! # Review Workflow
//!
//! Decides which actions an application's detail view offers, collects the
//! approve/deny dialog input, and dispatches exactly one mutation per
//! action.
//!
//! Every action is checked locally before any network call: the role must
//! hold the permission, an inspector must have a county on file, and the
//! status must admit the transition. A refused or failed action leaves the
//! caller's copy of the application untouched; the updated record is only
//! returned on success.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use pyro_client::{Account, Application, ClientError, ManageRequest, PortalClient};
use pyro_core::{DocumentType, Role};
use pyro_state::{
    can_delete, ensure_deletable, inspection_access, next_status, offered_actions, Approval,
    ApprovalInput, ApprovalRequirement, GateError, ManageAction, ManageError, OfferedAction,
    PermissionTable, Rejection, RejectionInput, StatusError,
};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("another action is already in progress")]
    Busy,
    #[error("{role} may not {action:?} this application")]
    NotPermitted { role: Role, action: OfferedAction },
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Manage(#[from] ManageError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

// ─── Action panel ────────────────────────────────────────────────────

/// Actions shown for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPanel {
    offered: Vec<OfferedAction>,
    loading: bool,
}

impl ActionPanel {
    pub fn new(table: &PermissionTable, role: Role, application: &Application) -> Self {
        Self {
            offered: offered_actions(table, role, application.status),
            loading: false,
        }
    }

    pub fn offered(&self) -> &[OfferedAction] {
        &self.offered
    }

    pub fn is_offered(&self, action: OfferedAction) -> bool {
        self.offered.contains(&action)
    }

    /// Offered and nothing in flight.
    pub fn is_enabled(&self, action: OfferedAction) -> bool {
        self.is_offered(action) && !self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

// ─── Dialogs ─────────────────────────────────────────────────────────

/// Deny dialog. Confirm stays disabled until a non-blank reason is entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenyDialog {
    input: RejectionInput,
}

impl DenyDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.input.remarks = reason.into();
    }

    pub fn reason(&self) -> &str {
        &self.input.remarks
    }

    pub fn can_confirm(&self) -> bool {
        self.input.is_ready()
    }

    pub fn confirm(&self) -> Result<Rejection, ManageError> {
        self.input.validate()
    }
}

/// Approve dialog, prefilled with the inspector's stored signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveDialog {
    input: ApprovalInput,
}

impl ApproveDialog {
    pub fn for_application(application: &Application, inspector: Option<&Account>) -> Self {
        Self {
            input: ApprovalInput {
                inspector_signature: inspector
                    .and_then(|a| a.user_signature.clone())
                    .unwrap_or_default(),
                start_date: application.start_date,
                expiration_date: application.expiration_date,
                payment_check_uploaded: application.has_document(DocumentType::PaymentCheck),
            },
        }
    }

    pub fn set_signature(&mut self, signature: impl Into<String>) {
        self.input.inspector_signature = signature.into();
    }

    pub fn set_start_date(&mut self, date: NaiveDate) {
        self.input.start_date = Some(date);
    }

    pub fn set_expiration_date(&mut self, date: NaiveDate) {
        self.input.expiration_date = Some(date);
    }

    /// The payment check was uploaded from within the dialog.
    pub fn mark_payment_check_uploaded(&mut self) {
        self.input.payment_check_uploaded = true;
    }

    pub fn missing(&self) -> Vec<ApprovalRequirement> {
        self.input.missing()
    }

    pub fn can_confirm(&self) -> bool {
        self.input.is_ready()
    }

    pub fn confirm(&self) -> Result<Approval, ManageError> {
        self.input.validate()
    }
}

// ─── Controller ──────────────────────────────────────────────────────

/// Dispatches review actions for one signed-in account.
#[derive(Debug, Clone)]
pub struct Workflow {
    client: PortalClient,
    table: Arc<PermissionTable>,
    role: Role,
    county: Option<String>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the action finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Workflow {
    pub fn new(client: PortalClient, table: Arc<PermissionTable>, account: &Account) -> Self {
        Self {
            client,
            table,
            role: account.current_role,
            county: account.county.clone(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn panel(&self, application: &Application) -> ActionPanel {
        let mut panel = ActionPanel::new(&self.table, self.role, application);
        panel.set_loading(self.is_loading());
        panel
    }

    fn begin(&self) -> Result<InFlight<'_>, WorkflowError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkflowError::Busy)?;
        Ok(InFlight(&self.in_flight))
    }

    fn check_manage(
        &self,
        application: &Application,
        action: ManageAction,
        offered: OfferedAction,
    ) -> Result<(), WorkflowError> {
        if !self.table.is_allowed(
            pyro_core::Service::Applications,
            self.role,
            action.required_action(),
        ) {
            return Err(WorkflowError::NotPermitted {
                role: self.role,
                action: offered,
            });
        }
        inspection_access(self.role, self.county.as_deref())?;
        next_status(application.status, action.transition())?;
        Ok(())
    }

    async fn manage(
        &self,
        application: &Application,
        request: ManageRequest,
        offered: OfferedAction,
    ) -> Result<Application, WorkflowError> {
        self.check_manage(application, request.action, offered)?;
        let _guard = self.begin()?;
        let updated = self
            .client
            .applications()
            .manage(&application.application_id, &request)
            .await?;
        tracing::info!(
            application_id = %application.application_id,
            from = %application.status,
            to = %updated.status,
            action = %request.action,
            "workflow transition"
        );
        Ok(updated)
    }

    /// `submitted` → `in-review`.
    pub async fn mark_in_review(&self, application: &Application) -> Result<Application, WorkflowError> {
        self.manage(application, ManageRequest::in_review(), OfferedAction::MarkInReview)
            .await
    }

    /// `in-review` → `approved`.
    pub async fn approve(
        &self,
        application: &Application,
        dialog: &ApproveDialog,
    ) -> Result<Application, WorkflowError> {
        self.check_manage(application, ManageAction::Approve, OfferedAction::Approve)?;
        let approval = dialog.confirm()?;
        self.manage(application, ManageRequest::approve(approval), OfferedAction::Approve)
            .await
    }

    /// `in-review` → `rejected`.
    pub async fn reject(
        &self,
        application: &Application,
        dialog: &DenyDialog,
    ) -> Result<Application, WorkflowError> {
        self.check_manage(application, ManageAction::Reject, OfferedAction::Reject)?;
        let rejection = dialog.confirm()?;
        self.manage(application, ManageRequest::reject(rejection), OfferedAction::Reject)
            .await
    }

    /// Soft delete while the application is still a draft, pending, or
    /// submitted.
    pub async fn delete(&self, application: &Application) -> Result<(), WorkflowError> {
        if !can_delete(&self.table, self.role, application.status) {
            ensure_deletable(application.status)?;
            return Err(WorkflowError::NotPermitted {
                role: self.role,
                action: OfferedAction::Delete,
            });
        }
        let _guard = self.begin()?;
        self.client
            .applications()
            .delete(&application.application_id)
            .await?;
        tracing::info!(application_id = %application.application_id, "application deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyro_core::{ApplicationId, ApplicationType, Timestamp, UserId};
    use pyro_state::ApplicationStatus;

    fn application(status: ApplicationStatus) -> Application {
        Application {
            application_id: ApplicationId::new("a1").unwrap(),
            application_type: ApplicationType::Permit,
            applicant_user_id: UserId::new("u1").unwrap(),
            status,
            application_details: None,
            draft_form: None,
            documents_uploaded: Default::default(),
            submission_time: None,
            last_modified_time: Timestamp::now(),
            inspection_time: None,
            start_date: None,
            expiration_date: None,
            user_signature: None,
            inspector_signature: None,
            remarks: None,
            county: None,
        }
    }

    #[test]
    fn panel_offers_review_actions_to_inspectors() {
        let table = PermissionTable::default();
        let panel = ActionPanel::new(&table, Role::Inspector, &application(ApplicationStatus::InReview));
        assert!(panel.is_enabled(OfferedAction::Approve));
        assert!(panel.is_enabled(OfferedAction::Reject));
        assert!(!panel.is_offered(OfferedAction::Edit));
    }

    #[test]
    fn loading_panel_disables_everything() {
        let table = PermissionTable::default();
        let mut panel = ActionPanel::new(&table, Role::User, &application(ApplicationStatus::Draft));
        assert!(panel.is_enabled(OfferedAction::Edit));
        panel.set_loading(true);
        assert!(panel.is_offered(OfferedAction::Edit));
        assert!(!panel.is_enabled(OfferedAction::Edit));
    }

    #[test]
    fn deny_requires_non_blank_reason() {
        let mut dialog = DenyDialog::new();
        assert!(!dialog.can_confirm());
        dialog.set_reason("   \n");
        assert!(!dialog.can_confirm());
        assert_eq!(dialog.confirm(), Err(ManageError::MissingRemarks));
        dialog.set_reason("  Site plan missing setbacks ");
        assert!(dialog.can_confirm());
        assert_eq!(dialog.confirm().unwrap().remarks, "Site plan missing setbacks");
    }

    #[test]
    fn approve_dialog_prefills_from_records() {
        let mut app = application(ApplicationStatus::InReview);
        app.documents_uploaded.insert(
            DocumentType::PaymentCheck,
            pyro_client::UploadedFile {
                upload_date: Timestamp::now(),
                size: 10,
                path: "a1/payment_check/check.png".into(),
                file_name: "check.png".into(),
            },
        );
        let mut inspector = Account::new_applicant(UserId::new("i1").unwrap(), "i1@example.gov");
        inspector.user_signature = Some("data:image/png;base64,AAAA".into());

        let mut dialog = ApproveDialog::for_application(&app, Some(&inspector));
        assert_eq!(
            dialog.missing(),
            vec![ApprovalRequirement::StartDate, ApprovalRequirement::ExpirationDate]
        );
        dialog.set_start_date(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
        dialog.set_expiration_date(NaiveDate::from_ymd_opt(2026, 7, 5).unwrap());
        assert!(dialog.can_confirm());
    }

    #[test]
    fn approve_dialog_blocks_without_signature() {
        let app = application(ApplicationStatus::InReview);
        let dialog = ApproveDialog::for_application(&app, None);
        let missing = dialog.missing();
        assert!(missing.contains(&ApprovalRequirement::InspectorSignature));
        assert!(missing.contains(&ApprovalRequirement::PaymentCheck));
        assert!(dialog.confirm().is_err());
    }
}
