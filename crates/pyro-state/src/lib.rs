//! # pyro-state: Application Lifecycle and Permissions
//!
//! The only rule-bearing logic of the portal lives here:
//!
//! - **Permission table** (`permission.rs`): service → role → action tokens.
//!   Advisory on the client, authoritative in the backend; both consult the
//!   same table.
//!
//! - **Status lifecycle** (`application.rs`):
//!
//!   ```text
//!   Draft ──▶ Submitted ──▶ InReview ──▶ Approved ──▶ Expired
//!     ▲  │        ▲              │
//!     └──┘        │              └──▶ Rejected
//!   (save)    Pending
//!   ```
//!
//!   Terminal states: `Approved` (until it expires), `Rejected`, `Expired`.
//!
//! - **Manage inputs** (`manage.rs`): what an approval or denial must carry
//!   before it may be dispatched.
//!
//! - **Gating** (`gating.rs`): which actions to offer a role for a status.

pub mod application;
pub mod gating;
pub mod manage;
pub mod permission;

pub use application::{
    effective_status, ensure_deletable, ensure_editable, next_status, ApplicationLifecycle,
    ApplicationStatus, StatusError, StatusTransitionRecord, Transition,
};
pub use gating::{
    can_delete, can_edit, can_submit, inspection_access, offered_actions, GateError, OfferedAction,
};
pub use manage::{
    Approval, ApprovalInput, ApprovalRequirement, ManageAction, ManageError, Rejection,
    RejectionInput,
};
pub use permission::{ActionSet, PermissionConfigError, PermissionTable};
