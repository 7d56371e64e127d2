//! # pyro-client: Typed Rust client for the permit portal REST API
//!
//! Provides typed access to the three backend resources:
//! - **Applications**: list, get, create (incl. drafts), update, delete,
//!   manage (approve / reject / in-review), metrics
//! - **Documents**: presigned uploads, signed read URLs, deletion
//! - **Users**: accounts and role changes
//!
//! ## Request Path
//!
//! Every call goes through one transport that attaches the bearer token,
//! retries idempotent GETs on transport failure, refreshes the session once
//! on 401/403, maps non-2xx answers to [`ClientError::Api`], and reports
//! failures to a [`Notifier`] unless the call opted out.
//!
//! ## Caching
//!
//! Reads are cached by request key and tagged; any mutation that touches an
//! application invalidates the list tag so the next list read refetches.
//! Metrics are never cached. Signing in as someone else, signing out, or a
//! failed refresh empties the cache, as does a role change.
//!
//! This crate does not enforce workflow rules. Callers check transitions
//! and permissions with `pyro-state` before dispatching.

pub mod applications;
pub mod cache;
pub mod config;
pub mod documents;
pub mod error;
pub mod notify;
pub(crate) mod retry;
pub mod session;
pub(crate) mod transport;
pub mod types;
pub mod users;

pub use config::{AppConfig, ClientConfig, ConfigError, Customizations, Environment, StartupConfig};
pub use documents::{ProgressFn, UploadProgress};
pub use error::ClientError;
pub use notify::{CollectingNotifier, Notifier, RequestOptions, Toast, ToastLevel, TracingNotifier};
pub use session::{RefreshError, Session, SessionState, StaticToken, TokenSource};
pub use types::{
    Account, Application, ApplicationMetrics, ApplicationQuery, ApplicationWrite, DocumentQuery,
    ManageRequest, Page, PresignRequest, PresignedUpload, RoleChange, SignedUrl, UploadedFile,
    UserQuery,
};

use std::sync::Arc;

use transport::Transport;

/// Top-level portal client. Holds one sub-client per resource.
#[derive(Debug, Clone)]
pub struct PortalClient {
    transport: Transport,
    applications: applications::ApplicationClient,
    documents: documents::DocumentClient,
    users: users::UserClient,
}

impl PortalClient {
    /// Client authenticated with the configured static token; toasts go to
    /// the log.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let token = Arc::new(StaticToken::new(config.api_token.as_str()));
        Self::with_parts(config, token, Arc::new(TracingNotifier))
    }

    /// Client with an explicit token source and notification sink.
    pub fn with_parts(
        config: ClientConfig,
        tokens: Arc<dyn TokenSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        let transport = Transport::new(http, config.api_url, Session::new(tokens), notifier);

        Ok(Self {
            applications: applications::ApplicationClient::new(transport.clone()),
            documents: documents::DocumentClient::new(transport.clone()),
            users: users::UserClient::new(transport.clone()),
            transport,
        })
    }

    /// Access the applications client.
    pub fn applications(&self) -> &applications::ApplicationClient {
        &self.applications
    }

    /// Access the documents client.
    pub fn documents(&self) -> &documents::DocumentClient {
        &self.documents
    }

    /// Access the users client.
    pub fn users(&self) -> &users::UserClient {
        &self.users
    }

    pub fn session(&self) -> &Session {
        self.transport.session()
    }

    pub fn cache(&self) -> &cache::QueryCache {
        self.transport.cache()
    }
}
