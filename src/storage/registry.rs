//! Thread-Safe File Registry
//!
//! This module implements the single source of truth for every live file.
//! It is a `HashMap<String, Entry>` behind one exclusive lock, shared by all
//! request handlers and the background expiry sweeper.
//!
//! ## Design Decisions
//!
//! 1. **One Lock**: Entry counts and per-operation hold times are small, so a
//!    single coarse lock keeps the mutation protocol trivially correct. Every
//!    operation, including the sweep, takes the same lock.
//! 2. **Fair Mutex**: `parking_lot::Mutex` hands the lock over fairly under
//!    contention, so a stream of readers cannot starve writers.
//! 3. **Never Across I/O**: `get` hands back a cheap clone of the entry
//!    (`Bytes` is reference-counted). Callers stream the bytes after the lock
//!    has been released.
//! 4. **Read-Time Expiry**: `get` treats an expired entry as absent even if the
//!    sweeper has not removed it yet. It never removes it; that is the sweep's job.
//!
//! ## Concurrency Model
//!
//! ```text
//!  upload ──put──────┐
//!  download ──get────┤      ┌──────────────────────────┐
//!  download ──delete─┼─────>│ Mutex<HashMap<Key,Entry>>│
//!  sweeper ──sweep───┘      └──────────────────────────┘
//! ```
//!
//! For a single key, operations are ordered by lock acquisition: whatever
//! committed last under the lock wins.

use crate::storage::Entry;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A key removed by a sweep, reported back for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted {
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

/// The registry of live files.
///
/// # Thread Safety
///
/// This struct is designed to be wrapped in an `Arc` and shared across all
/// request handlers and the expiry sweeper. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use temp_file_registry::storage::{Entry, Registry};
/// use bytes::Bytes;
/// use chrono::{Duration, Utc};
///
/// let registry = Registry::new();
/// let expires_at = Utc::now() + Duration::minutes(10);
///
/// registry.put(Entry::new("report", Bytes::from("hello"), expires_at));
///
/// let entry = registry.get("report").unwrap();
/// assert_eq!(entry.content, Bytes::from("hello"));
///
/// registry.delete("report");
/// assert!(registry.get("report").is_none());
/// ```
#[derive(Default)]
pub struct Registry {
    entries: Mutex<HashMap<String, Entry>>,

    /// Source of per-put generation stamps
    next_generation: AtomicU64,

    /// Statistics: total PUT operations
    put_count: AtomicU64,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: GET operations that found a live entry
    hit_count: AtomicU64,

    /// Statistics: DELETE operations that removed an entry
    del_count: AtomicU64,

    /// Statistics: entries removed by sweeps
    expired_count: AtomicU64,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .field("put_count", &self.put_count.load(Ordering::Relaxed))
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entry under its key, replacing any previous one.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new key was created, `false` if an existing entry was replaced.
    pub fn put(&self, mut entry: Entry) -> bool {
        self.put_count.fetch_add(1, Ordering::Relaxed);
        entry.set_generation(self.next_generation.fetch_add(1, Ordering::Relaxed) + 1);

        let previous = {
            let mut entries = self.entries.lock();
            entries.insert(entry.key.clone(), entry)
        };

        // The replaced entry's buffer is released here, outside the lock.
        previous.is_none()
    }

    /// Gets the live entry for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.get_at(key, Utc::now())
    }

    /// Gets the entry for a key as of `now`.
    ///
    /// The entry is not removed even when expired.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Entry> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let found = {
            let entries = self.entries.lock();
            entries
                .get(key)
                .filter(|entry| !entry.is_expired_at(now))
                .cloned()
        };

        if found.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }

        found
    }

    /// Deletes a key from the registry.
    ///
    /// Deleting an absent key is a no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was deleted, `false` if it didn't exist.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.entries.lock().remove(key);

        match removed {
            Some(_) => {
                self.del_count.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Deletes a key only if it still holds the entry that was read.
    ///
    /// An entry stored by a later put under the same key is left alone.
    ///
    /// # Returns
    ///
    /// Returns `true` if the read entry was deleted.
    pub fn delete_if_same(&self, key: &str, read: &Entry) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            match entries.get(key) {
                Some(current) if current.generation() == read.generation() => entries.remove(key),
                _ => None,
            }
        };

        match removed {
            Some(_) => {
                self.del_count.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Removes every entry whose expiry is at or before `now`.
    ///
    /// Each entry is visited exactly once, all under the lock.
    ///
    /// # Returns
    ///
    /// The keys that were removed, with the expiry they had.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<Evicted> {
        let mut evicted = Vec::new();

        {
            let mut entries = self.entries.lock();
            entries.retain(|key, entry| {
                if entry.is_expired_at(now) {
                    evicted.push(Evicted {
                        key: key.clone(),
                        expires_at: entry.expires_at,
                    });
                    false
                } else {
                    true
                }
            });
        }

        if !evicted.is_empty() {
            self.expired_count
                .fetch_add(evicted.len() as u64, Ordering::Relaxed);
        }

        evicted
    }

    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns registry statistics.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            entries: self.len() as u64,
            put_ops: self.put_count.load(Ordering::Relaxed),
            get_ops: self.get_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            deleted: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of entries currently stored
    pub entries: u64,
    /// Total PUT operations
    pub put_ops: u64,
    /// Total GET operations
    pub get_ops: u64,
    /// GET operations that found a live entry
    pub hits: u64,
    /// Entries removed by DELETE
    pub deleted: u64,
    /// Entries removed by sweeps
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Duration;

    fn entry(key: &str, value: &'static str, expires_at: DateTime<Utc>) -> Entry {
        Entry::new(key, Bytes::from(value), expires_at)
    }

    fn in_ten_minutes() -> DateTime<Utc> {
        Utc::now() + Duration::minutes(10)
    }

    #[test]
    fn test_put_and_get() {
        let registry = Registry::new();

        assert!(registry.put(entry("key", "value", in_ten_minutes())));
        let found = registry.get("key").unwrap();
        assert_eq!(found.key, "key");
        assert_eq!(found.content, Bytes::from("value"));
    }

    #[test]
    fn test_get_is_repeatable() {
        let registry = Registry::new();
        registry.put(entry("key", "value", in_ten_minutes()));

        for _ in 0..3 {
            assert_eq!(registry.get("key").unwrap().content, Bytes::from("value"));
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let registry = Registry::new();
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_put_replaces() {
        let registry = Registry::new();

        assert!(registry.put(entry("key", "first", in_ten_minutes())));
        assert!(!registry.put(entry("key", "second", in_ten_minutes())));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("key").unwrap().content, Bytes::from("second"));
    }

    #[test]
    fn test_empty_key_is_a_regular_key() {
        let registry = Registry::new();

        registry.put(entry("", "anonymous", in_ten_minutes()));
        assert_eq!(registry.get("").unwrap().content, Bytes::from("anonymous"));

        registry.put(entry("", "overwritten", in_ten_minutes()));
        assert_eq!(registry.get("").unwrap().content, Bytes::from("overwritten"));
    }

    #[test]
    fn test_delete() {
        let registry = Registry::new();

        registry.put(entry("key", "value", in_ten_minutes()));
        assert!(registry.delete("key"));
        assert!(registry.get("key").is_none());
        assert!(!registry.delete("key")); // Already deleted
        assert!(registry.is_empty());
    }

    #[test]
    fn test_delete_if_same() {
        let registry = Registry::new();

        registry.put(entry("key", "first", in_ten_minutes()));
        let first = registry.get("key").unwrap();
        registry.put(entry("key", "second", in_ten_minutes()));
        let second = registry.get("key").unwrap();
        assert_ne!(first.generation(), second.generation());

        // The first read no longer owns the key
        assert!(!registry.delete_if_same("key", &first));
        assert_eq!(registry.get("key").unwrap().content, Bytes::from("second"));

        assert!(registry.delete_if_same("key", &second));
        assert!(registry.is_empty());
        assert!(!registry.delete_if_same("key", &second));
        assert_eq!(registry.stats().deleted, 1);
    }

    #[test]
    fn test_get_hides_expired_entry_without_removing_it() {
        let registry = Registry::new();
        let now = Utc::now();

        registry.put(entry("stale", "value", now - Duration::seconds(1)));

        assert!(registry.get_at("stale", now).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_read_before_default_expiry() {
        // Uploaded with a ten minute expiry, read five minutes later
        let registry = Registry::new();
        let uploaded_at = Utc::now();

        registry.put(entry("b", "value", uploaded_at + Duration::minutes(10)));

        let later = uploaded_at + Duration::minutes(5);
        assert!(registry.get_at("b", later).is_some());
        assert!(registry.get_at("b", uploaded_at + Duration::minutes(10)).is_none());
    }

    #[test]
    fn test_sweep_boundary_is_inclusive() {
        let registry = Registry::new();
        let expires_at = Utc::now();

        registry.put(entry("edge", "value", expires_at));

        let evicted = registry.sweep_expired(expires_at);
        assert_eq!(
            evicted,
            vec![Evicted {
                key: "edge".to_string(),
                expires_at,
            }]
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let registry = Registry::new();
        let now = Utc::now();

        registry.put(entry("old1", "v", now - Duration::minutes(2)));
        registry.put(entry("old2", "v", now - Duration::seconds(1)));
        registry.put(entry("fresh", "v", now + Duration::minutes(1)));

        let mut keys: Vec<String> = registry
            .sweep_expired(now)
            .into_iter()
            .map(|evicted| evicted.key)
            .collect();
        keys.sort();

        assert_eq!(keys, vec!["old1", "old2"]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get_at("fresh", now).is_some());

        // A second sweep at the same instant finds nothing
        assert!(registry.sweep_expired(now).is_empty());
    }

    #[test]
    fn test_zero_minute_entry_swept_one_second_later() {
        let registry = Registry::new();
        let uploaded_at = Utc::now();

        registry.put(entry("a", "value", uploaded_at + Duration::minutes(0)));

        let evicted = registry.sweep_expired(uploaded_at + Duration::seconds(1));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].key, "a");
    }

    #[test]
    fn test_stats() {
        let registry = Registry::new();
        let now = Utc::now();

        registry.put(entry("a", "v", now + Duration::minutes(1)));
        registry.put(entry("b", "v", now - Duration::minutes(1)));
        registry.get_at("a", now);
        registry.get_at("missing", now);
        registry.delete("a");
        registry.sweep_expired(now);

        let stats = registry.stats();
        assert_eq!(
            stats,
            RegistryStats {
                entries: 0,
                put_ops: 2,
                get_ops: 2,
                hits: 1,
                deleted: 1,
                expired: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(Registry::new());
        let expires_at = in_ten_minutes();
        let mut handles = vec![];

        // Writers, each owning a disjoint key range
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for j in 0..200 {
                    let key = format!("key-{}-{}", i, j);
                    let value = Bytes::from(key.clone());
                    registry.put(Entry::new(key.clone(), value, expires_at));
                    let found = registry.get(&key).unwrap();
                    assert_eq!(found.content, Bytes::from(key));
                }
            }));
        }

        // Readers and sweepers racing the writers
        for _ in 0..4 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for j in 0..200 {
                    if let Some(found) = registry.get(&format!("key-0-{}", j)) {
                        assert_eq!(found.content, Bytes::from(found.key.clone()));
                    }
                    assert!(registry.sweep_expired(Utc::now()).is_empty());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 1600);
        for i in 0..8 {
            for j in 0..200 {
                let key = format!("key-{}-{}", i, j);
                assert_eq!(registry.get(&key).unwrap().content, Bytes::from(key));
            }
        }
    }
}
