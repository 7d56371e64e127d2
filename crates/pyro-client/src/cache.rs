//! Tag-based query cache.
//!
//! Successful reads are stored under their request key together with the
//! tags they depend on. A mutation invalidates by tag; every entry carrying
//! that tag is dropped so the next read refetches.
//!
//! Entries expire `keep_unused_for` after they were last read. A zero
//! duration means "never cache", which is how metrics are fetched.
//!
//! The cache also remembers which session generation filled it. Observing a
//! different generation empties it, so one identity never reads entries
//! cached for another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pyro_core::{ApplicationId, UserId};
use serde::de::DeserializeOwned;

/// Default retention for unused entries.
pub const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

/// What a cached response depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Any application list page.
    ApplicationList,
    Application(ApplicationId),
    UserList,
    Account(UserId),
}

#[derive(Debug)]
struct Entry {
    value: serde_json::Value,
    tags: Vec<CacheTag>,
    last_used: Instant,
    keep_unused_for: Duration,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, Entry>>,
    generation: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the cache if it was filled under another session generation.
    pub fn observe_generation(&self, generation: u64) {
        let previous = self.generation.swap(generation, Ordering::AcqRel);
        if previous != generation {
            let mut entries = self.entries.lock();
            if !entries.is_empty() {
                tracing::debug!(
                    previous,
                    generation,
                    dropped = entries.len(),
                    "session changed, cache cleared"
                );
            }
            entries.clear();
        }
    }

    /// A live entry for `key`, refreshing its last-used time.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let fresh = entries
            .get(key)
            .map(|e| now.duration_since(e.last_used) <= e.keep_unused_for)?;
        if !fresh {
            entries.remove(key);
            return None;
        }
        let entry = entries.get_mut(key)?;
        entry.last_used = now;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn insert(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
        tags: Vec<CacheTag>,
        keep_unused_for: Duration,
    ) {
        if keep_unused_for.is_zero() {
            return;
        }
        self.entries.lock().insert(
            key.into(),
            Entry {
                value,
                tags,
                last_used: Instant::now(),
                keep_unused_for,
            },
        );
    }

    /// Drop every entry tagged with any of `tags`. Returns how many went.
    pub fn invalidate(&self, tags: &[CacheTag]) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.tags.iter().any(|t| tags.contains(t)));
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(?tags, dropped, "cache invalidated");
        }
        dropped
    }

    /// Drop entries unused for longer than their retention.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .lock()
            .retain(|_, e| now.duration_since(e.last_used) <= e.keep_unused_for);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
