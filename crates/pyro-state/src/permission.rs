//! # Permission Table
//!
//! Static, process-wide mapping `service → role → ordered action set`.
//! Loaded once as configuration; there is no inheritance, no conflict
//! resolution, and no dynamic policy.
//!
//! ## Lookup Contract
//!
//! - [`PermissionTable::allowed`] returns exactly the configured set.
//! - A missing `(service, role)` entry is an empty set, never an error.
//! - [`Action::All`] (`*`) in a set grants every action.
//!
//! ## File Format
//!
//! ```yaml
//! applications:
//!   admin: ["*"]
//!   user: [create, view, download, edit, revoke, delete]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use pyro_core::{Action, Role, Service};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMPTY: ActionSet = ActionSet(Vec::new());

/// Ordered, duplicate-free set of action tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(Vec<Action>);

impl ActionSet {
    /// Build a set, keeping first occurrence order and dropping duplicates.
    pub fn new(actions: &[Action]) -> Self {
        let mut out = Vec::with_capacity(actions.len());
        for a in actions {
            if !out.contains(a) {
                out.push(*a);
            }
        }
        Self(out)
    }

    /// Whether `action` is granted, honouring the `*` wildcard.
    pub fn contains(&self, action: Action) -> bool {
        self.0.iter().any(|a| *a == Action::All || *a == action)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.0
    }
}

/// Errors loading a permission table from configuration.
#[derive(Error, Debug)]
pub enum PermissionConfigError {
    #[error("failed to read permission table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid YAML permission table: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON permission table: {0}")]
    Json(#[from] serde_json::Error),
}

/// `service → role → actions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable {
    entries: BTreeMap<Service, BTreeMap<Role, ActionSet>>,
}

impl PermissionTable {
    /// A table granting nothing.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Builder: set the action set for one `(service, role)` pair.
    pub fn with_grant(mut self, service: Service, role: Role, actions: &[Action]) -> Self {
        self.entries
            .entry(service)
            .or_default()
            .insert(role, ActionSet::new(actions));
        self
    }

    /// The configured set for `(service, role)`; empty when unconfigured.
    pub fn allowed(&self, service: Service, role: Role) -> &ActionSet {
        self.entries
            .get(&service)
            .and_then(|roles| roles.get(&role))
            .unwrap_or(&EMPTY)
    }

    /// Lookup by raw tokens. Unknown service or role yields the empty set.
    pub fn allowed_by_name(&self, service: &str, role: &str) -> &ActionSet {
        match (service.parse::<Service>(), role.parse::<Role>()) {
            (Ok(s), Ok(r)) => self.allowed(s, r),
            _ => &EMPTY,
        }
    }

    pub fn is_allowed(&self, service: Service, role: Role, action: Action) -> bool {
        self.allowed(service, role).contains(action)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, PermissionConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, PermissionConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> Result<Self, PermissionConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| PermissionConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }
}

impl Default for PermissionTable {
    /// The table the portal ships with.
    fn default() -> Self {
        use Action::*;
        Self::empty()
            .with_grant(Service::Applications, Role::Admin, &[All])
            .with_grant(
                Service::Applications,
                Role::Inspector,
                &[View, Download, Review, Approve, Reject, Edit],
            )
            .with_grant(
                Service::Applications,
                Role::User,
                &[Create, View, Download, Edit, Revoke, Delete],
            )
            .with_grant(Service::Documents, Role::Admin, &[All])
            .with_grant(Service::Documents, Role::Inspector, &[Create, View, Download])
            .with_grant(Service::Documents, Role::User, &[Create, View, Download, Delete])
            .with_grant(Service::Users, Role::Admin, &[All])
            .with_grant(Service::Users, Role::Inspector, &[View, Edit])
            .with_grant(Service::Users, Role::User, &[View, Edit])
    }
}
