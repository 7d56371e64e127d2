//! # Application Status Lifecycle
//!
//! ## States
//!
//! ```text
//! Draft ──submit──▶ Submitted ──mark in review──▶ InReview ──approve──▶ Approved ──expire──▶ Expired
//!   │ ▲                 ▲                             │
//!   └─┘ save draft      │ submit                      └──reject──▶ Rejected
//!                    Pending
//! ```
//!
//! - `Pending` is assigned by the backend to a submission that still awaits
//!   applicant follow-up. Submitting it again moves it to `Submitted`.
//! - `Expired` is never requested by a user. The backend derives it once an
//!   approved application's expiration date has passed; see
//!   [`effective_status`].
//! - Editing leaves the status unchanged and is allowed only while
//!   [`ApplicationStatus::is_editable`]. Deletion is a soft delete allowed only
//!   while [`ApplicationStatus::is_deletable`].
//!
//! The same rules run on both sides of the wire: the workflow refuses an
//! illegal transition before any request is made, and the backend rejects it
//! again with 409.

use chrono::NaiveDate;
use pyro_core::{Timestamp, UserId, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Status ──────────────────────────────────────────────────────────

/// Lifecycle status of a permit or license application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    /// Partially filled, saved by the applicant.
    Draft,
    /// Held by the backend awaiting applicant follow-up.
    Pending,
    /// Submitted, waiting for an inspector.
    Submitted,
    /// An inspector has started evaluating it.
    InReview,
    /// Approved with a validity window (terminal until expiry).
    Approved,
    /// Denied with remarks (terminal).
    Rejected,
    /// Validity window elapsed (terminal).
    Expired,
}

impl ApplicationStatus {
    pub const ALL: &'static [ApplicationStatus] = &[
        Self::Draft,
        Self::Pending,
        Self::Submitted,
        Self::InReview,
        Self::Approved,
        Self::Rejected,
        Self::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::InReview => "in-review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Expired)
    }

    /// Whether the applicant may still change the application content.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending | Self::Submitted)
    }

    /// Whether the application may still be withdrawn (soft delete).
    pub fn is_deletable(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending | Self::Submitted)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| ValidationError::UnknownToken {
                kind: "application status",
                value: s.to_string(),
            })
    }
}

// ─── Transitions ─────────────────────────────────────────────────────

/// A status-changing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    SaveDraft,
    Submit,
    MarkInReview,
    Approve,
    Reject,
    Expire,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SaveDraft => "save draft",
            Self::Submit => "submit",
            Self::MarkInReview => "mark in review",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Expire => "expire",
        };
        f.write_str(s)
    }
}

/// Errors raised by the lifecycle rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("cannot {transition} an application that is {from}")]
    InvalidTransition {
        from: ApplicationStatus,
        transition: Transition,
    },

    #[error("application is {status} and can no longer change")]
    Terminal { status: ApplicationStatus },

    #[error("application is {status} and can no longer be edited")]
    NotEditable { status: ApplicationStatus },

    #[error("application is {status} and can no longer be deleted")]
    NotDeletable { status: ApplicationStatus },
}

/// The status reached by applying `transition` to `from`.
///
/// # Errors
///
/// [`StatusError::Terminal`] for rejected/expired sources, and
/// [`StatusError::InvalidTransition`] for any other illegal pair.
pub fn next_status(
    from: ApplicationStatus,
    transition: Transition,
) -> Result<ApplicationStatus, StatusError> {
    use ApplicationStatus::*;
    let to = match (from, transition) {
        (Draft, Transition::SaveDraft) => Draft,
        (Draft | Pending, Transition::Submit) => Submitted,
        (Submitted, Transition::MarkInReview) => InReview,
        (InReview, Transition::Approve) => Approved,
        (InReview, Transition::Reject) => Rejected,
        (Approved, Transition::Expire) => Expired,
        (Rejected | Expired, _) => return Err(StatusError::Terminal { status: from }),
        _ => return Err(StatusError::InvalidTransition { from, transition }),
    };
    Ok(to)
}

/// Check that the content of an application in `status` may change.
pub fn ensure_editable(status: ApplicationStatus) -> Result<(), StatusError> {
    if status.is_editable() {
        Ok(())
    } else {
        Err(StatusError::NotEditable { status })
    }
}

/// Check that an application in `status` may be soft-deleted.
pub fn ensure_deletable(status: ApplicationStatus) -> Result<(), StatusError> {
    if status.is_deletable() {
        Ok(())
    } else {
        Err(StatusError::NotDeletable { status })
    }
}

/// Status as observed on `today`: approved applications past their
/// expiration date read as expired.
pub fn effective_status(
    status: ApplicationStatus,
    expiration_date: Option<NaiveDate>,
    today: NaiveDate,
) -> ApplicationStatus {
    match (status, expiration_date) {
        (ApplicationStatus::Approved, Some(expires)) if expires < today => {
            ApplicationStatus::Expired
        }
        _ => status,
    }
}

// ─── Lifecycle with history ──────────────────────────────────────────

/// One applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransitionRecord {
    pub from_status: ApplicationStatus,
    pub to_status: ApplicationStatus,
    pub transition: Transition,
    pub timestamp: Timestamp,
    /// Who requested it; `None` for backend-derived transitions.
    pub actor: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Current status plus the ordered log of transitions that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLifecycle {
    status: ApplicationStatus,
    transitions: Vec<StatusTransitionRecord>,
}

impl ApplicationLifecycle {
    /// A freshly saved draft.
    pub fn new_draft() -> Self {
        Self::starting_at(ApplicationStatus::Draft)
    }

    /// A record entering the lifecycle at `status` (e.g. a direct submit).
    pub fn starting_at(status: ApplicationStatus) -> Self {
        Self {
            status,
            transitions: Vec::new(),
        }
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn transitions(&self) -> &[StatusTransitionRecord] {
        &self.transitions
    }

    /// Apply `transition`, recording it on success. State is unchanged on error.
    pub fn apply(
        &mut self,
        transition: Transition,
        actor: Option<UserId>,
        remarks: Option<String>,
    ) -> Result<ApplicationStatus, StatusError> {
        let to = next_status(self.status, transition)?;
        self.transitions.push(StatusTransitionRecord {
            from_status: self.status,
            to_status: to,
            transition,
            timestamp: Timestamp::now(),
            actor,
            remarks,
        });
        self.status = to;
        Ok(to)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Default for ApplicationLifecycle {
    fn default() -> Self {
        Self::new_draft()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn inspector() -> Option<UserId> {
        Some(UserId::new("inspector-7").unwrap())
    }

    // ── Happy path ───────────────────────────────────────────────────

    #[test]
    fn test_full_lifecycle_to_approval() {
        let mut app = ApplicationLifecycle::new_draft();
        app.apply(Transition::SaveDraft, None, None).unwrap();
        app.apply(Transition::Submit, None, None).unwrap();
        app.apply(Transition::MarkInReview, inspector(), None).unwrap();
        app.apply(Transition::Approve, inspector(), None).unwrap();
        assert_eq!(app.status(), Approved);
        assert!(app.is_terminal());
        assert_eq!(app.transitions().len(), 4);
        assert_eq!(app.transitions()[2].from_status, Submitted);
        assert_eq!(app.transitions()[2].to_status, InReview);
    }

    #[test]
    fn test_rejection_records_remarks() {
        let mut app = ApplicationLifecycle::starting_at(InReview);
        app.apply(Transition::Reject, inspector(), Some("Missing insurance".into()))
            .unwrap();
        assert_eq!(app.status(), Rejected);
        assert_eq!(app.transitions()[0].remarks.as_deref(), Some("Missing insurance"));
    }

    #[test]
    fn test_pending_can_be_submitted() {
        assert_eq!(next_status(Pending, Transition::Submit), Ok(Submitted));
    }

    #[test]
    fn test_approved_expires() {
        assert_eq!(next_status(Approved, Transition::Expire), Ok(Expired));
    }

    // ── Illegal transitions ──────────────────────────────────────────

    #[test]
    fn test_cannot_approve_before_review() {
        assert_eq!(
            next_status(Submitted, Transition::Approve),
            Err(StatusError::InvalidTransition {
                from: Submitted,
                transition: Transition::Approve
            })
        );
    }

    #[test]
    fn test_cannot_review_a_draft() {
        assert!(next_status(Draft, Transition::MarkInReview).is_err());
    }

    #[test]
    fn test_save_draft_only_from_draft() {
        assert!(next_status(Submitted, Transition::SaveDraft).is_err());
        assert!(next_status(Pending, Transition::SaveDraft).is_err());
    }

    #[test]
    fn test_terminal_states_refuse_everything() {
        for status in [Rejected, Expired] {
            for t in [
                Transition::SaveDraft,
                Transition::Submit,
                Transition::MarkInReview,
                Transition::Approve,
                Transition::Reject,
                Transition::Expire,
            ] {
                assert_eq!(next_status(status, t), Err(StatusError::Terminal { status }));
            }
        }
    }

    #[test]
    fn test_failed_apply_leaves_state_unchanged() {
        let mut app = ApplicationLifecycle::starting_at(Submitted);
        assert!(app.apply(Transition::Approve, inspector(), None).is_err());
        assert_eq!(app.status(), Submitted);
        assert!(app.transitions().is_empty());
    }

    // ── Edit / delete gates ──────────────────────────────────────────

    #[test]
    fn test_edit_only_before_review() {
        for status in ApplicationStatus::ALL {
            let expected = matches!(status, Draft | Pending | Submitted);
            assert_eq!(status.is_editable(), expected, "{status}");
            assert_eq!(ensure_editable(*status).is_ok(), expected);
        }
    }

    #[test]
    fn test_delete_disabled_from_review_onward() {
        for status in [InReview, Approved, Rejected, Expired] {
            assert_eq!(
                ensure_deletable(status),
                Err(StatusError::NotDeletable { status })
            );
        }
        for status in [Draft, Pending, Submitted] {
            assert!(ensure_deletable(status).is_ok());
        }
    }

    // ── Expiry derivation ────────────────────────────────────────────

    #[test]
    fn test_effective_status_expires_after_expiration_date() {
        let expires = date(2026, 7, 5);
        assert_eq!(effective_status(Approved, Some(expires), date(2026, 7, 5)), Approved);
        assert_eq!(effective_status(Approved, Some(expires), date(2026, 7, 6)), Expired);
        assert_eq!(effective_status(Approved, None, date(2030, 1, 1)), Approved);
        assert_eq!(effective_status(InReview, Some(expires), date(2030, 1, 1)), InReview);
    }

    // ── Wire format ──────────────────────────────────────────────────

    #[test]
    fn test_status_wire_tokens() {
        assert_eq!(serde_json::to_string(&InReview).unwrap(), "\"in-review\"");
        for status in ApplicationStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), *status);
        }
        assert!("under_review".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_lifecycle_serialization() {
        let mut app = ApplicationLifecycle::new_draft();
        app.apply(Transition::Submit, None, None).unwrap();
        let json = serde_json::to_string(&app).unwrap();
        let parsed: ApplicationLifecycle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, app);
    }
}
