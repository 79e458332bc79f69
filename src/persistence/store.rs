//! Keyed snapshot storage
//!
//! [`SnapshotStore`] is the contract a backend fulfils: get, an atomic
//! set-with-expiry and delete, each one logical call. Nothing here retries,
//! backs off or locks; failures surface as the backend's own error type.
//!
//! [`MemoryStore`] is an in-process backend with per-entry expiry.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Keyed string store with expiry
///
/// Implementations must make [`set_with_expiry`](Self::set_with_expiry)
/// atomic: a reader never observes the new value without its expiry.
#[allow(async_fn_in_trait)]
pub trait SnapshotStore {
    /// Backend failure, handed back to callers untouched
    type Error;

    /// Read the value under `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write `value` under `key`, expiring `ttl_secs` seconds from now
    ///
    /// Overwrites any existing value and restarts its expiry.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64)
        -> Result<(), Self::Error>;

    /// Remove the value under `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), Self::Error>;
}

/// Longest expiry [`MemoryStore`] honours; larger TTLs are clamped
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 3600;

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process [`SnapshotStore`]
///
/// Clones share the same entries, so several streams in one process can
/// hand snapshots to each other through it. Expired entries are dropped
/// when `get` touches them, and all of them are swept on every
/// [`PURGE_INTERVAL`]th write, so keys that are written and never read
/// again do not pile up.
///
/// # Example
///
/// ```
/// use devstream::persistence::{MemoryStore, SnapshotStore};
///
/// let store = MemoryStore::new();
/// pollster::block_on(async {
///     store.set_with_expiry("latency:api", "{}", 60).await.unwrap();
///     assert_eq!(store.get("latency:api").await.unwrap().as_deref(), Some("{}"));
/// });
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    writes: u64,
}

/// Writes between full sweeps of expired entries in [`MemoryStore`]
pub const PURGE_INTERVAL: u64 = 64;

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Entries are plain data; a panic elsewhere cannot leave one half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().entries.values().filter(|e| e.is_live(now)).count()
    }

    /// Number of stored entries, expired ones not yet dropped included
    pub fn allocated(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if no live entries remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time left before `key` expires, `None` if absent or expired
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at - now)
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.lock().entries.retain(|_, e| e.is_live(now));
    }
}

impl SnapshotStore for MemoryStore {
    type Error = Infallible;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let now = Instant::now();
        let mut inner = self.lock();
        match inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                inner.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), Self::Error> {
        let now = Instant::now();
        let expires_at = now + Duration::from_secs(ttl_secs.min(MAX_TTL_SECS));

        // Value and expiry land under one lock.
        let mut inner = self.lock();
        inner.writes += 1;
        if inner.writes % PURGE_INTERVAL == 0 {
            inner.entries.retain(|_, e| e.is_live(now));
        }
        inner.entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.lock().entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn test_set_get_delete() {
        let store = MemoryStore::new();
        block_on(async {
            assert_eq!(store.get("k").await.unwrap(), None);

            store.set_with_expiry("k", "v1", 60).await.unwrap();
            assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

            store.set_with_expiry("k", "v2", 60).await.unwrap();
            assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

            store.delete("k").await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), None);

            // deleting again is fine
            store.delete("k").await.unwrap();
        });
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let store = MemoryStore::new();
        block_on(async {
            store.set_with_expiry("k", "v", 0).await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), None);
        });
        assert_eq!(store.ttl("k"), None);
    }

    #[test]
    fn test_ttl_restarts_on_write() {
        let store = MemoryStore::new();
        block_on(store.set_with_expiry("k", "v", 10)).unwrap();
        assert!(store.ttl("k").unwrap() <= Duration::from_secs(10));

        block_on(store.set_with_expiry("k", "v", 3600)).unwrap();
        let ttl = store.ttl("k").unwrap();
        assert!(ttl > Duration::from_secs(3500) && ttl <= Duration::from_secs(3600));
    }

    #[test]
    fn test_clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();
        block_on(a.set_with_expiry("shared", "x", 60)).unwrap();
        assert_eq!(block_on(b.get("shared")).unwrap().as_deref(), Some("x"));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryStore::new();
        block_on(async {
            store.set_with_expiry("gone", "v", 0).await.unwrap();
            store.set_with_expiry("kept", "v", 60).await.unwrap();
        });
        store.purge_expired();
        assert_eq!(store.len(), 1);
        assert!(store.ttl("kept").is_some());
    }

    #[test]
    fn test_writes_sweep_unread_expired_keys() {
        let store = MemoryStore::new();
        block_on(async {
            for i in 0..PURGE_INTERVAL * 4 {
                let key = format!("once:{}", i);
                store.set_with_expiry(&key, "v", 0).await.unwrap();
            }
        });

        assert_eq!(store.len(), 0);
        assert!(
            store.allocated() < PURGE_INTERVAL as usize,
            "{} expired entries still held",
            store.allocated()
        );
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let store = MemoryStore::new();
        block_on(async {
            store.set_with_expiry("kept", "v", 60).await.unwrap();
            for i in 0..PURGE_INTERVAL {
                store.set_with_expiry(&format!("gone:{}", i), "v", 0).await.unwrap();
            }
            assert_eq!(store.get("kept").await.unwrap().as_deref(), Some("v"));
        });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let store = MemoryStore::new();
        block_on(store.set_with_expiry("k", "v", u64::MAX)).unwrap();
        assert!(store.ttl("k").is_some());
    }
}
