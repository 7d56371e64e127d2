//! # Manage Actions
//!
//! The inspector-side "manage" mutation carries one [`ManageAction`] plus an
//! action-specific payload. The payload must be complete before the request
//! may be dispatched:
//!
//! - **approve**: inspector signature, start date, expiration date, and an
//!   uploaded payment check. The expiration must not precede the start.
//! - **reject**: a non-whitespace reason, shown to the applicant.
//! - **in-review**: no payload.

use chrono::NaiveDate;
use pyro_core::{Action, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::Transition;

/// Action token of the manage mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManageAction {
    #[serde(rename = "approve")]
    Approve,
    #[serde(rename = "reject")]
    Reject,
    #[serde(rename = "in-review")]
    InReview,
}

impl ManageAction {
    pub const ALL: &'static [ManageAction] = &[Self::Approve, Self::Reject, Self::InReview];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::InReview => "in-review",
        }
    }

    /// The status transition this action requests.
    pub fn transition(&self) -> Transition {
        match self {
            Self::Approve => Transition::Approve,
            Self::Reject => Transition::Reject,
            Self::InReview => Transition::MarkInReview,
        }
    }

    /// The `applications` permission a role needs to perform it.
    pub fn required_action(&self) -> Action {
        match self {
            Self::Approve => Action::Approve,
            Self::Reject => Action::Reject,
            Self::InReview => Action::Review,
        }
    }
}

impl std::fmt::Display for ManageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ManageAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| ValidationError::UnknownToken {
                kind: "manage action",
                value: s.to_string(),
            })
    }
}

/// A missing or inconsistent piece of an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalRequirement {
    InspectorSignature,
    StartDate,
    ExpirationDate,
    PaymentCheck,
    ExpirationAfterStart,
}

impl std::fmt::Display for ApprovalRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InspectorSignature => "inspector signature is required",
            Self::StartDate => "start date is required",
            Self::ExpirationDate => "expiration date is required",
            Self::PaymentCheck => "payment check must be uploaded",
            Self::ExpirationAfterStart => "expiration date cannot be before start date",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManageError {
    #[error("approval is incomplete: {}", join_requirements(.0))]
    IncompleteApproval(Vec<ApprovalRequirement>),

    #[error("a rejection reason is required")]
    MissingRemarks,
}

fn join_requirements(missing: &[ApprovalRequirement]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Approval dialog contents as the inspector fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalInput {
    /// Base64 image data of the drawn signature.
    pub inspector_signature: String,
    pub start_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub payment_check_uploaded: bool,
}

/// A complete approval payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub inspector_signature: String,
    pub start_date: NaiveDate,
    pub expiration_date: NaiveDate,
}

impl ApprovalInput {
    /// Everything still blocking submission, in dialog order.
    pub fn missing(&self) -> Vec<ApprovalRequirement> {
        let mut missing = Vec::new();
        if self.inspector_signature.trim().is_empty() {
            missing.push(ApprovalRequirement::InspectorSignature);
        }
        if self.start_date.is_none() {
            missing.push(ApprovalRequirement::StartDate);
        }
        if self.expiration_date.is_none() {
            missing.push(ApprovalRequirement::ExpirationDate);
        }
        if !self.payment_check_uploaded {
            missing.push(ApprovalRequirement::PaymentCheck);
        }
        if let (Some(start), Some(end)) = (self.start_date, self.expiration_date) {
            if end < start {
                missing.push(ApprovalRequirement::ExpirationAfterStart);
            }
        }
        missing
    }

    /// Whether the approve button is enabled.
    pub fn is_ready(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn validate(&self) -> Result<Approval, ManageError> {
        let missing = self.missing();
        match (self.start_date, self.expiration_date) {
            (Some(start_date), Some(expiration_date)) if missing.is_empty() => Ok(Approval {
                inspector_signature: self.inspector_signature.clone(),
                start_date,
                expiration_date,
            }),
            _ => Err(ManageError::IncompleteApproval(missing)),
        }
    }
}

/// Deny dialog contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionInput {
    pub remarks: String,
}

/// A complete rejection payload; remarks are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub remarks: String,
}

impl RejectionInput {
    pub fn new(remarks: impl Into<String>) -> Self {
        Self {
            remarks: remarks.into(),
        }
    }

    /// Whether the deny button is enabled.
    pub fn is_ready(&self) -> bool {
        !self.remarks.trim().is_empty()
    }

    pub fn validate(&self) -> Result<Rejection, ManageError> {
        let remarks = self.remarks.trim();
        if remarks.is_empty() {
            return Err(ManageError::MissingRemarks);
        }
        Ok(Rejection {
            remarks: remarks.to_string(),
        })
    }
}
