//! Process-lifetime key/value cache with per-entry expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;

use super::clock::{Clock, SystemClock};

/// A cached value and the instant it stops being fresh.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Result of a non-evicting read.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<V> {
    Fresh(V),
    Stale(V),
    Missing,
}

impl<V> Lookup<V> {
    /// The value if it is still within its TTL.
    pub fn fresh(self) -> Option<V> {
        match self {
            Self::Fresh(value) => Some(value),
            _ => None,
        }
    }
}

/// Volatile cache keyed by string.
///
/// Entries expire lazily: [`get`](Self::get) treats an expired entry as
/// absent and drops it, while [`lookup`](Self::lookup) and
/// [`get_stale`](Self::get_stale) leave it in place so it can still serve
/// as a last-resort fallback. [`sweep_expired`](Self::sweep_expired)
/// reclaims whatever is left.
pub struct EphemeralCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> EphemeralCache<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Fresh value for `key`; an expired entry is removed and reported absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        match self.lookup_at(key, now) {
            Lookup::Fresh(value) => Some(value),
            Lookup::Stale(_) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                debug!("Cache entry '{}' expired, evicted on read", key);
                None
            }
            Lookup::Missing => None,
        }
    }

    /// Read without evicting, reporting whether the entry is past its TTL.
    pub fn lookup(&self, key: &str) -> Lookup<V> {
        self.lookup_at(key, self.clock.now())
    }

    /// Any value stored under `key`, ignoring expiry.
    pub fn get_stale(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store `value`, replacing any existing entry. Expires at `now + ttl`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> Lookup<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => Lookup::Stale(entry.value.clone()),
            Some(entry) => Lookup::Fresh(entry.value.clone()),
            None => Lookup::Missing,
        }
    }
}

impl<V: Clone> Default for EphemeralCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
