//! Session tokens and refresh.
//!
//! The identity provider is external; the client only sees a
//! [`TokenSource`]. On a 401 or 403 the client asks the source to refresh
//! once and replays the request. If the refresh fails the session is marked
//! invalid and every later call fails fast with `SessionExpired` until a new
//! token is installed.
//!
//! Every change of identity (sign-in, sign-out, a failed refresh) bumps the
//! session generation. Cached reads from an older generation are discarded.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use zeroize::Zeroizing;

/// Boxed future returned by [`TokenSource::refresh`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = Result<(), RefreshError>> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
#[error("token refresh failed: {reason}")]
pub struct RefreshError {
    pub reason: String,
}

/// Supplies bearer tokens.
pub trait TokenSource: Send + Sync {
    /// The current access token, if signed in.
    fn access_token(&self) -> Option<Zeroizing<String>>;

    /// Obtain a fresh access token.
    fn refresh(&self) -> RefreshFuture<'_>;
}

/// A fixed token that cannot be refreshed.
pub struct StaticToken {
    token: Zeroizing<String>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").field("token", &"[REDACTED]").finish()
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Option<Zeroizing<String>> {
        Some(self.token.clone())
    }

    fn refresh(&self) -> RefreshFuture<'_> {
        Box::pin(async {
            Err::<(), _>(RefreshError {
                reason: "static tokens cannot be refreshed".into(),
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Valid,
    /// Re-authentication required.
    Invalid,
}

/// Token source plus validity flag, shared by all sub-clients.
pub struct Session {
    source: RwLock<Arc<dyn TokenSource>>,
    state: RwLock<SessionState>,
    generation: AtomicU64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("state", &self.state()).finish()
    }
}

impl Session {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source: RwLock::new(source),
            state: RwLock::new(SessionState::Valid),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn is_valid(&self) -> bool {
        self.state() == SessionState::Valid
    }

    /// Bumped whenever the identity behind the session may have changed.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn bearer(&self) -> Option<Zeroizing<String>> {
        self.source.read().access_token()
    }

    /// Try one refresh; on failure the session becomes invalid.
    pub(crate) async fn refresh(&self) -> bool {
        let source = Arc::clone(&*self.source.read());
        match source.refresh().await {
            Ok(()) => {
                tracing::info!("session token refreshed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "session invalidated");
                *self.state.write() = SessionState::Invalid;
                self.bump_generation();
                false
            }
        }
    }

    /// Install a new token source after re-authentication.
    pub fn sign_in(&self, source: Arc<dyn TokenSource>) {
        *self.source.write() = source;
        *self.state.write() = SessionState::Valid;
        self.bump_generation();
    }

    pub fn sign_out(&self) {
        *self.state.write() = SessionState::Invalid;
        self.bump_generation();
    }
}
