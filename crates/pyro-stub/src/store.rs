//! In-memory storage backed by `DashMap`.
//!
//! Applications, accounts, stored objects, and outstanding presigned
//! grants each get their own map. Applications carry a creation sequence
//! number so listings come back in a stable order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use pyro_client::{Account, Application};
use pyro_core::{ApplicationId, DocumentType, Role, Timestamp, UserId};
use pyro_state::{ApplicationLifecycle, ApplicationStatus, PermissionTable, StatusError, Transition};

/// Startup settings.
#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Base URL clients reach the stub at; presigned and signed URLs point
    /// back here.
    pub public_url: String,
    pub permissions: PermissionTable,
    /// Account seeded with the admin role so roles can be handed out.
    pub admin: Option<UserId>,
}

impl StubConfig {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
            permissions: PermissionTable::default(),
            admin: UserId::new("admin").ok(),
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionTable) -> Self {
        self.permissions = permissions;
        self
    }
}

/// An application plus the bookkeeping the wire record does not carry.
#[derive(Debug, Clone)]
pub struct StoredApplication {
    /// Creation order; listings sort by it.
    pub seq: u64,
    pub record: Application,
    pub lifecycle: ApplicationLifecycle,
    /// Soft-deleted records stay in the map but are invisible.
    pub deleted: bool,
}

impl StoredApplication {
    /// Move the record to `transition`'s target and stamp it.
    pub fn apply(
        &mut self,
        transition: Transition,
        actor: &UserId,
        remarks: Option<String>,
    ) -> Result<ApplicationStatus, StatusError> {
        let status = self
            .lifecycle
            .apply(transition, Some(actor.clone()), remarks)?;
        self.record.status = status;
        self.touch();
        Ok(status)
    }

    /// Advance `LastModifiedTime`. Strictly increasing so two writes in the
    /// same second still produce distinct version tokens.
    pub fn touch(&mut self) {
        let now = Timestamp::now();
        let previous = self.record.last_modified_time;
        self.record.last_modified_time = if now > previous {
            now
        } else {
            Timestamp::from_utc(*previous.as_datetime() + chrono::Duration::seconds(1))
        };
    }

    /// Record an elapsed expiration date as a real transition.
    pub fn refresh_expiry(&mut self, today: NaiveDate) {
        if self.record.effective_status(today) == ApplicationStatus::Expired
            && self.record.status == ApplicationStatus::Approved
        {
            if let Ok(status) = self.lifecycle.apply(Transition::Expire, None, None) {
                self.record.status = status;
            }
        }
    }
}

/// Bytes stored at a key.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A presigned `PUT` not yet used.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub key: String,
    pub document_type: DocumentType,
    pub file_name: String,
    pub owner: UserId,
    pub application_id: Option<ApplicationId>,
    pub expires_at: Timestamp,
}

/// A signed read URL.
#[derive(Debug, Clone)]
pub struct ReadGrant {
    pub key: String,
    pub expires_at: Timestamp,
}

struct Inner {
    config: StubConfig,
    applications: DashMap<ApplicationId, StoredApplication>,
    users: DashMap<UserId, Account>,
    /// Documents uploaded before an application existed, per account.
    user_documents: DashMap<(UserId, DocumentType), pyro_client::UploadedFile>,
    objects: DashMap<String, StoredObject>,
    pending_uploads: DashMap<String, PendingUpload>,
    read_grants: DashMap<String, ReadGrant>,
    sequence: AtomicU64,
}

/// Shared state. Clones share the same data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(config: StubConfig) -> Self {
        let users = DashMap::new();
        if let Some(admin) = &config.admin {
            let mut account = Account::new_applicant(admin.clone(), "admin@localhost");
            account.current_role = Role::Admin;
            users.insert(admin.clone(), account);
        }
        Self {
            inner: Arc::new(Inner {
                config,
                applications: DashMap::new(),
                users,
                user_documents: DashMap::new(),
                objects: DashMap::new(),
                pending_uploads: DashMap::new(),
                read_grants: DashMap::new(),
                sequence: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &StubConfig {
        &self.inner.config
    }

    pub fn permissions(&self) -> &PermissionTable {
        &self.inner.config.permissions
    }

    pub fn public_url(&self) -> &str {
        &self.inner.config.public_url
    }

    pub fn applications(&self) -> &DashMap<ApplicationId, StoredApplication> {
        &self.inner.applications
    }

    pub fn users(&self) -> &DashMap<UserId, Account> {
        &self.inner.users
    }

    pub fn user_documents(&self) -> &DashMap<(UserId, DocumentType), pyro_client::UploadedFile> {
        &self.inner.user_documents
    }

    pub fn objects(&self) -> &DashMap<String, StoredObject> {
        &self.inner.objects
    }

    pub fn pending_uploads(&self) -> &DashMap<String, PendingUpload> {
        &self.inner.pending_uploads
    }

    pub fn read_grants(&self) -> &DashMap<String, ReadGrant> {
        &self.inner.read_grants
    }

    /// Drop presigned uploads and read grants that expired before `now`.
    pub fn purge_expired_grants(&self, now: Timestamp) {
        self.inner.pending_uploads.retain(|_, p| p.expires_at >= now);
        self.inner.read_grants.retain(|_, g| g.expires_at >= now);
    }

    pub fn next_seq(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert `account`, replacing any existing one.
    pub fn put_account(&self, account: Account) {
        self.inner.users.insert(account.user_id.clone(), account);
    }
}
