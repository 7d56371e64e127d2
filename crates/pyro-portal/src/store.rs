//! # Portal State
//!
//! The portal's client-side state is one [`PortalState`] value split into
//! four slices. It changes only by folding [`PortalEvent`]s through
//! [`reduce`], which is pure: the same state and event always give the same
//! next state.
//!
//! | Slice | Persisted | Synchronized across tabs |
//! |-------|-----------|--------------------------|
//! | `auth` | yes (minus status/error) | yes |
//! | `account` | yes (minus status/error) | yes |
//! | `common` | no | yes |
//! | `uploads` | no | no |

use std::collections::BTreeMap;

use pyro_client::{Account, Customizations, Toast};
use pyro_core::{DocumentType, UserId};
use serde::{Deserialize, Serialize};

use crate::uploads::UploadState;

/// Progress of the request that fills a slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Names of the state slices, used by the persistence and sync allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slice {
    Auth,
    Account,
    Common,
    Uploads,
}

impl Slice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Account => "account",
            Self::Common => "common",
            Self::Uploads => "uploads",
        }
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    /// False once a token refresh has failed.
    pub session_valid: bool,
    pub status: LoadStatus,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some() && self.session_valid
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub account: Option<Account>,
    pub status: LoadStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonState {
    pub customizations: Customizations,
    /// Pending notifications, oldest first.
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalState {
    pub auth: AuthState,
    pub account: AccountState,
    pub common: CommonState,
    /// Per-document upload progress for the form being edited.
    pub uploads: BTreeMap<DocumentType, UploadState>,
}

impl PortalState {
    pub fn upload(&self, document_type: DocumentType) -> &UploadState {
        self.uploads.get(&document_type).unwrap_or(&UploadState::Idle)
    }
}

/// Everything that can change portal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortalEvent {
    SignInStarted,
    SignedIn { user_id: UserId, email: String },
    SignInFailed { message: String },
    SessionExpired,
    /// Clears every slice.
    SignedOut,
    AccountLoading,
    AccountLoaded { account: Account },
    AccountFailed { message: String },
    CustomizationsLoaded { customizations: Customizations },
    ToastRaised { toast: Toast },
    ToastsCleared,
    UploadChanged {
        document_type: DocumentType,
        state: UploadState,
    },
    UploadsReset,
}

impl PortalEvent {
    /// The slice this event writes to.
    pub fn slice(&self) -> Slice {
        match self {
            Self::SignInStarted
            | Self::SignedIn { .. }
            | Self::SignInFailed { .. }
            | Self::SessionExpired
            | Self::SignedOut => Slice::Auth,
            Self::AccountLoading | Self::AccountLoaded { .. } | Self::AccountFailed { .. } => {
                Slice::Account
            }
            Self::CustomizationsLoaded { .. } | Self::ToastRaised { .. } | Self::ToastsCleared => {
                Slice::Common
            }
            Self::UploadChanged { .. } | Self::UploadsReset => Slice::Uploads,
        }
    }
}

/// Next state after `event`.
pub fn reduce(mut state: PortalState, event: &PortalEvent) -> PortalState {
    match event {
        PortalEvent::SignInStarted => {
            state.auth.status = LoadStatus::Loading;
            state.auth.error = None;
        }
        PortalEvent::SignedIn { user_id, email } => {
            state.auth = AuthState {
                user_id: Some(user_id.clone()),
                email: Some(email.clone()),
                session_valid: true,
                status: LoadStatus::Succeeded,
                error: None,
            };
        }
        PortalEvent::SignInFailed { message } => {
            state.auth.status = LoadStatus::Failed;
            state.auth.error = Some(message.clone());
        }
        PortalEvent::SessionExpired => {
            state.auth.session_valid = false;
        }
        PortalEvent::SignedOut => {
            // Branding survives sign-out.
            let customizations = std::mem::take(&mut state.common.customizations);
            state = PortalState::default();
            state.common.customizations = customizations;
        }
        PortalEvent::AccountLoading => {
            state.account.status = LoadStatus::Loading;
            state.account.error = None;
        }
        PortalEvent::AccountLoaded { account } => {
            state.account = AccountState {
                account: Some(account.clone()),
                status: LoadStatus::Succeeded,
                error: None,
            };
        }
        PortalEvent::AccountFailed { message } => {
            state.account.status = LoadStatus::Failed;
            state.account.error = Some(message.clone());
        }
        PortalEvent::CustomizationsLoaded { customizations } => {
            state.common.customizations = customizations.clone();
        }
        PortalEvent::ToastRaised { toast } => state.common.toasts.push(toast.clone()),
        PortalEvent::ToastsCleared => state.common.toasts.clear(),
        PortalEvent::UploadChanged {
            document_type,
            state: upload,
        } => {
            state.uploads.insert(*document_type, upload.clone());
        }
        PortalEvent::UploadsReset => state.uploads.clear(),
    }
    state
}
