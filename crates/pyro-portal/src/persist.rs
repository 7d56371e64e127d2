//! # Persisted Portal State
//!
//! A subset of [`PortalState`] survives restarts: the `auth` and `account`
//! slices, without their request status and error fields. Everything else
//! starts fresh.
//!
//! Storage goes through the [`KeyValueStore`] trait. [`FileStore`] keeps one
//! JSON file per key under `{root}/{namespace}/{key}.json`; [`MemoryStore`]
//! is for tests and ephemeral sessions.
//!
//! A stored entry that no longer parses is dropped with a warning and the
//! slice starts empty; it is never an error for the caller.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use pyro_client::Account;
use pyro_core::UserId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::store::{PortalState, Slice};

/// Default namespace for the portal's persisted keys.
pub const PERSIST_NAMESPACE: &str = "pyro-portal";

/// Slices written by [`save_persisted`].
pub const PERSISTED_SLICES: &[Slice] = &[Slice::Auth, Slice::Account];

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("invalid store key {key:?}: must match [a-z0-9][a-z0-9-]{{0,63}}")]
    InvalidKey { key: String },
    #[error("failed to encode slice {slice}: {source}")]
    Encode {
        slice: Slice,
        source: serde_json::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// String key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

fn validate_key(key: &str) -> Result<(), PersistError> {
    let mut chars = key.chars();
    let valid = key.len() <= 64
        && matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PersistError::InvalidKey { key: key.into() })
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        validate_key(key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        validate_key(key)?;
        self.entries.lock().insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        validate_key(key)?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One JSON file per key under `{root}/{namespace}/`.
///
/// The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>, namespace: &str) -> Result<Self, PersistError> {
        validate_key(namespace)?;
        Ok(Self {
            dir: root.as_ref().join(namespace),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, PersistError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir)?;
        // Write then rename so a crash never leaves a truncated entry.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedAuth {
    user_id: Option<UserId>,
    email: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedAccount {
    account: Option<Account>,
}

fn write_slice<T: Serialize>(
    store: &dyn KeyValueStore,
    slice: Slice,
    value: &T,
) -> Result<(), PersistError> {
    let text = serde_json::to_string(value).map_err(|source| PersistError::Encode { slice, source })?;
    store.set(slice.as_str(), &text)
}

fn read_slice<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    slice: Slice,
) -> Result<T, PersistError> {
    let Some(text) = store.get(slice.as_str())? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(slice = %slice, error = %e, "dropping unreadable persisted slice");
            store.remove(slice.as_str())?;
            Ok(T::default())
        }
    }
}

/// Write the persisted slices of `state`.
pub fn save_persisted(store: &dyn KeyValueStore, state: &PortalState) -> Result<(), PersistError> {
    for slice in PERSISTED_SLICES {
        match slice {
            Slice::Auth => write_slice(
                store,
                *slice,
                &PersistedAuth {
                    user_id: state.auth.user_id.clone(),
                    email: state.auth.email.clone(),
                },
            )?,
            Slice::Account => write_slice(
                store,
                *slice,
                &PersistedAccount {
                    account: state.account.account.clone(),
                },
            )?,
            Slice::Common | Slice::Uploads => {}
        }
    }
    Ok(())
}

/// State restored from `store`; slices not persisted start at their defaults.
///
/// A restored identity is assumed to have a valid session until a request
/// proves otherwise.
pub fn load_persisted(store: &dyn KeyValueStore) -> Result<PortalState, PersistError> {
    let auth: PersistedAuth = read_slice(store, Slice::Auth)?;
    let account: PersistedAccount = read_slice(store, Slice::Account)?;

    let mut state = PortalState::default();
    state.auth.session_valid = auth.user_id.is_some();
    state.auth.user_id = auth.user_id;
    state.auth.email = auth.email;
    state.account.account = account.account;
    Ok(state)
}

/// Remove every persisted slice, e.g. on sign-out.
pub fn clear_persisted(store: &dyn KeyValueStore) -> Result<(), PersistError> {
    for slice in PERSISTED_SLICES {
        store.remove(slice.as_str())?;
    }
    Ok(())
}
