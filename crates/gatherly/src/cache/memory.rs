//! In-memory TTL cache with LRU eviction.
//!
//! Entries carry their own time-to-live. Expiry is lazy: an expired entry is
//! removed by the lookup that finds it, and [`CacheStore::purge_expired`]
//! sweeps the rest on demand. Every read path checks validity before
//! returning, so an expired value is never handed out.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;

/// A single cached value with its creation time and lifetime.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// An entry is valid strictly before `stored_at + ttl`.
    fn is_valid_at(&self, now: Instant) -> bool {
        now < self.stored_at + self.ttl
    }
}

/// Thread-safe keyed store of expiring values.
///
/// Cloning is cheap and yields a handle to the same store. The lock is held
/// only for map operations and never across an `.await`.
pub struct CacheStore<K, V> {
    entries: Arc<Mutex<LruCache<K, CacheEntry<V>>>>,
}

impl<K, V> Clone for CacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a store holding at most `max_entries` entries.
    ///
    /// When full, the least recently used entry is evicted. A capacity of
    /// zero is raised to one.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave a half-written entry:
        // every mutation is a single LruCache call.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value if a live entry exists; drops it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        let now = Instant::now();

        match entries.peek(key) {
            Some(entry) if !entry.is_valid_at(now) => {
                entries.pop(key);
                None
            }
            Some(_) => entries.get(key).map(|entry| entry.value.clone()),
            None => None,
        }
    }

    /// Returns true if a live entry exists, without refreshing its recency.
    pub fn contains_key(&self, key: &K) -> bool {
        let entries = self.lock();
        entries
            .peek(key)
            .is_some_and(|entry| entry.is_valid_at(Instant::now()))
    }

    /// Returns when the live entry for `key` was stored.
    pub fn stored_at(&self, key: &K) -> Option<Instant> {
        let entries = self.lock();
        entries
            .peek(key)
            .filter(|entry| entry.is_valid_at(Instant::now()))
            .map(|entry| entry.stored_at)
    }

    /// Stores `value` under `key`, replacing any previous entry and stamping
    /// it with the current time.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.lock();
        entries.put(key, CacheEntry::new(value, ttl));
    }

    /// Removes the entry for `key`. Returns true if one was present.
    pub fn delete_key(&self, key: &K) -> bool {
        let mut entries = self.lock();
        entries.pop(key).is_some()
    }

    /// Removes every entry for which `predicate(key, value)` holds, live or
    /// expired. Returns how many entries were removed.
    pub fn delete_where(&self, predicate: impl Fn(&K, &V) -> bool) -> usize {
        let mut entries = self.lock();
        let doomed: Vec<K> = entries
            .iter()
            .filter(|(key, entry)| predicate(key, &entry.value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    /// Drops every entry.
    pub fn clear_all(&self) {
        let mut entries = self.lock();
        entries.clear();
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_valid_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + AsRef<str>,
    V: Clone,
{
    /// Removes every entry whose key starts with `prefix`.
    pub fn delete_by_prefix(&self, prefix: &str) -> usize {
        self.delete_where(|key, _| key.as_ref().starts_with(prefix))
    }
}
