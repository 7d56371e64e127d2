//! # Action Gating
//!
//! Combines the permission table with the status lifecycle to decide which
//! affordances a role is offered for an application. An action is offered
//! only when the role holds the permission AND the status admits it.

use pyro_core::{Action, Role, Service};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::{next_status, ApplicationStatus, Transition};
use crate::manage::ManageAction;
use crate::permission::PermissionTable;

/// An affordance on an application detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferedAction {
    Edit,
    Delete,
    MarkInReview,
    Approve,
    Reject,
}

impl OfferedAction {
    /// The manage mutation behind this affordance, if any.
    pub fn manage_action(&self) -> Option<ManageAction> {
        match self {
            Self::MarkInReview => Some(ManageAction::InReview),
            Self::Approve => Some(ManageAction::Approve),
            Self::Reject => Some(ManageAction::Reject),
            Self::Edit | Self::Delete => None,
        }
    }
}

/// Whether `role` may edit an application in `status`.
pub fn can_edit(table: &PermissionTable, role: Role, status: ApplicationStatus) -> bool {
    table.is_allowed(Service::Applications, role, Action::Edit) && status.is_editable()
}

/// Whether `role` may withdraw an application in `status`. Either `delete`
/// or `revoke` grants it.
pub fn can_delete(table: &PermissionTable, role: Role, status: ApplicationStatus) -> bool {
    let allowed = table.allowed(Service::Applications, role);
    (allowed.contains(Action::Delete) || allowed.contains(Action::Revoke)) && status.is_deletable()
}

fn can_manage(
    table: &PermissionTable,
    role: Role,
    status: ApplicationStatus,
    action: ManageAction,
) -> bool {
    table.is_allowed(Service::Applications, role, action.required_action())
        && next_status(status, action.transition()).is_ok()
}

/// Every action offered to `role` for an application in `status`, in
/// display order.
pub fn offered_actions(
    table: &PermissionTable,
    role: Role,
    status: ApplicationStatus,
) -> Vec<OfferedAction> {
    let mut offered = Vec::new();
    if can_edit(table, role, status) {
        offered.push(OfferedAction::Edit);
    }
    if can_delete(table, role, status) {
        offered.push(OfferedAction::Delete);
    }
    for (action, offer) in [
        (ManageAction::InReview, OfferedAction::MarkInReview),
        (ManageAction::Approve, OfferedAction::Approve),
        (ManageAction::Reject, OfferedAction::Reject),
    ] {
        if can_manage(table, role, status, action) {
            offered.push(offer);
        }
    }
    offered
}

/// Whether applicants may submit at all from `status` (draft or pending).
pub fn can_submit(table: &PermissionTable, role: Role, status: ApplicationStatus) -> bool {
    table.is_allowed(Service::Applications, role, Action::Create)
        && next_status(status, Transition::Submit).is_ok()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("a county must be set on the inspector profile before reviewing applications")]
    CountyRequired,
}

/// Inspectors are scoped by county and must have one on file before any
/// inspection-scoped read. Other roles pass unconditionally.
pub fn inspection_access(role: Role, county: Option<&str>) -> Result<(), GateError> {
    match role {
        Role::Inspector if county.map_or(true, |c| c.trim().is_empty()) => {
            Err(GateError::CountyRequired)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn test_edit_enabled_only_before_review() {
        let table = PermissionTable::default();
        for role in Role::ALL {
            for status in ApplicationStatus::ALL {
                let offered = offered_actions(&table, *role, *status).contains(&OfferedAction::Edit);
                if matches!(status, InReview | Approved | Rejected | Expired) {
                    assert!(!offered, "{role} offered edit at {status}");
                }
            }
        }
        assert!(can_edit(&table, Role::User, Draft));
        assert!(can_edit(&table, Role::User, Pending));
        assert!(can_edit(&table, Role::User, Submitted));
    }

    #[test]
    fn test_delete_disabled_from_review_onward() {
        let table = PermissionTable::default();
        for role in Role::ALL {
            for status in [InReview, Approved, Rejected, Expired] {
                assert!(!can_delete(&table, *role, status));
            }
        }
        assert!(can_delete(&table, Role::User, Submitted));
        assert!(!can_delete(&table, Role::Inspector, Submitted));
    }

    #[test]
    fn test_revoke_alone_grants_delete() {
        let table =
            PermissionTable::empty().with_grant(Service::Applications, Role::User, &[Action::Revoke]);
        assert!(can_delete(&table, Role::User, Draft));
    }

    #[test]
    fn test_inspector_actions_follow_status() {
        let table = PermissionTable::default();
        assert_eq!(
            offered_actions(&table, Role::Inspector, Submitted),
            vec![OfferedAction::Edit, OfferedAction::MarkInReview]
        );
        assert_eq!(
            offered_actions(&table, Role::Inspector, InReview),
            vec![OfferedAction::Approve, OfferedAction::Reject]
        );
        assert!(offered_actions(&table, Role::Inspector, Approved).is_empty());
    }

    #[test]
    fn test_applicant_never_offered_manage_actions() {
        let table = PermissionTable::default();
        for status in ApplicationStatus::ALL {
            let offered = offered_actions(&table, Role::User, *status);
            assert!(offered.iter().all(|a| a.manage_action().is_none()));
        }
    }

    #[test]
    fn test_empty_table_offers_nothing() {
        let table = PermissionTable::empty();
        for status in ApplicationStatus::ALL {
            assert!(offered_actions(&table, Role::Admin, *status).is_empty());
        }
    }

    #[test]
    fn test_submit_from_draft_and_pending() {
        let table = PermissionTable::default();
        assert!(can_submit(&table, Role::User, Draft));
        assert!(can_submit(&table, Role::User, Pending));
        assert!(!can_submit(&table, Role::User, Submitted));
        assert!(!can_submit(&table, Role::Inspector, Draft));
    }

    #[test]
    fn test_inspector_needs_county() {
        assert_eq!(inspection_access(Role::Inspector, None), Err(GateError::CountyRequired));
        assert_eq!(
            inspection_access(Role::Inspector, Some("  ")),
            Err(GateError::CountyRequired)
        );
        assert!(inspection_access(Role::Inspector, Some("Kent")).is_ok());
        assert!(inspection_access(Role::Admin, None).is_ok());
        assert!(inspection_access(Role::User, None).is_ok());
    }
}
