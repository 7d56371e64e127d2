//! Wire types for the portal REST backend.
//!
//! Field names follow the backend's PascalCase convention. List envelopes
//! (`items`, `total_count`) and query parameters (`offset`, `limit`,
//! `status`, `type`, `save_draft`) are lower case.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pyro_core::{ApplicationId, ApplicationType, DocumentType, PhoneNumber, Role, Timestamp, UserId};
use pyro_schema::{Address, ApplicationDetails, ApplicationForm};
use pyro_state::{effective_status, Approval, ApplicationStatus, ManageAction, Rejection};
use serde::{Deserialize, Serialize};

// -- Applications -------------------------------------------------------------

/// Descriptor of a document stored for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadedFile {
    pub upload_date: Timestamp,
    /// Bytes.
    pub size: u64,
    /// Object-storage key.
    pub path: String,
    /// Name shown to users.
    pub file_name: String,
}

/// One permit or license application as stored by the backend.
///
/// Exactly one of `application_details` (submitted onward) and
/// `draft_form` (draft) is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Application {
    pub application_id: ApplicationId,
    pub application_type: ApplicationType,
    pub applicant_user_id: UserId,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_details: Option<ApplicationDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_form: Option<ApplicationForm>,
    #[serde(default)]
    pub documents_uploaded: BTreeMap<DocumentType, UploadedFile>,
    #[serde(default)]
    pub submission_time: Option<Timestamp>,
    /// Server-stamped; doubles as the version token for updates.
    pub last_modified_time: Timestamp,
    #[serde(default)]
    pub inspection_time: Option<Timestamp>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_signature: Option<String>,
    /// Rejection reason shown to the applicant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
}

impl Application {
    pub fn has_document(&self, document_type: DocumentType) -> bool {
        self.documents_uploaded.contains_key(&document_type)
    }

    /// Status as of `today`, accounting for an elapsed expiration date.
    pub fn effective_status(&self, today: NaiveDate) -> ApplicationStatus {
        effective_status(self.status, self.expiration_date, today)
    }
}

/// Body of `POST /applications` and `PUT /applications/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationWrite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_details: Option<ApplicationDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_form: Option<ApplicationForm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_signature: Option<String>,
    /// `LastModifiedTime` the caller read; a mismatch is answered with 409.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_last_modified: Option<Timestamp>,
}

impl ApplicationWrite {
    /// A full submission.
    pub fn submission(details: ApplicationDetails) -> Self {
        Self {
            application_details: Some(details),
            ..Self::default()
        }
    }

    /// A partial save.
    pub fn draft(form: ApplicationForm) -> Self {
        Self {
            draft_form: Some(form),
            ..Self::default()
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.user_signature = Some(signature.into());
        self
    }

    pub fn expecting(mut self, last_modified: Timestamp) -> Self {
        self.expected_last_modified = Some(last_modified);
        self
    }

    pub fn application_type(&self) -> Option<ApplicationType> {
        self.application_details
            .as_ref()
            .map(ApplicationDetails::application_type)
            .or_else(|| self.draft_form.as_ref().map(ApplicationForm::application_type))
    }
}

/// Query string of `GET /applications`. `offset` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationQuery {
    pub offset: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub application_type: Option<ApplicationType>,
}

impl Default for ApplicationQuery {
    fn default() -> Self {
        Self {
            offset: 1,
            limit: 10,
            status: None,
            application_type: None,
        }
    }
}

impl ApplicationQuery {
    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_type(mut self, application_type: ApplicationType) -> Self {
        self.application_type = Some(application_type);
        self
    }

    pub fn page(mut self, offset: u32, limit: u32) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Stable key for caching identical queries.
    pub(crate) fn cache_key(&self) -> String {
        format!(
            "applications?offset={}&limit={}&status={}&type={}",
            self.offset,
            self.limit,
            self.status.map(|s| s.as_str()).unwrap_or(""),
            self.application_type.map(|t| t.as_str()).unwrap_or("")
        )
    }
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

/// Body of `PUT /applications/{id}/manage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManageRequest {
    pub action: ManageAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
}

impl ManageRequest {
    pub fn in_review() -> Self {
        Self {
            action: ManageAction::InReview,
            remarks: None,
            inspector_signature: None,
            start_date: None,
            expiration_date: None,
        }
    }

    pub fn approve(approval: Approval) -> Self {
        Self {
            action: ManageAction::Approve,
            remarks: None,
            inspector_signature: Some(approval.inspector_signature),
            start_date: Some(approval.start_date),
            expiration_date: Some(approval.expiration_date),
        }
    }

    pub fn reject(rejection: Rejection) -> Self {
        Self {
            action: ManageAction::Reject,
            remarks: Some(rejection.remarks),
            inspector_signature: None,
            start_date: None,
            expiration_date: None,
        }
    }
}

/// Dashboard counts from `GET /applications/metrics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationMetrics {
    pub total: u64,
    #[serde(default)]
    pub by_status: BTreeMap<ApplicationStatus, u64>,
    #[serde(default)]
    pub by_type: BTreeMap<ApplicationType, u64>,
}

impl ApplicationMetrics {
    pub fn count(&self, status: ApplicationStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

// -- Documents ----------------------------------------------------------------

/// Body of `POST /documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PresignRequest {
    pub document_type: DocumentType,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
}

/// A time-limited URL accepting one `PUT` of the file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    /// Object-storage key the upload will land at.
    pub key: String,
    pub expires_at: Timestamp,
}

/// Query string of `GET /documents` and `DELETE /documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentQuery {
    pub document_type: DocumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
}

/// A short-lived read URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignedUrl {
    pub url: String,
    pub file_name: String,
    pub expires_at: Timestamp,
}

// -- Users --------------------------------------------------------------------

/// A portal account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub user_id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<PhoneNumber>,
    #[serde(default)]
    pub address: Option<Address>,
    /// Required for inspectors before inspection-scoped reads.
    #[serde(default)]
    pub county: Option<String>,
    pub current_role: Role,
    /// Reused to prefill approval and submission signatures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_signature: Option<String>,
    /// Cleared by an admin deactivation; accounts are never hard-deleted.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Account {
    /// The record created on a first authenticated session.
    pub fn new_applicant(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            address: None,
            county: None,
            current_role: Role::User,
            user_signature: None,
            active: true,
        }
    }
}

/// Body of `PUT /roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleChange {
    pub user_id: UserId,
    pub role: Role,
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserQuery {
    pub offset: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            offset: 1,
            limit: 25,
            role: None,
        }
    }
}
