//! In-memory read-through cache with per-read time-to-live
//!
//! Entries only remember when they were captured. The freshness tolerance is
//! supplied by each reader, so two callers can read the same entry with
//! different tolerances. Expiry is checked lazily on read; a read that finds an
//! entry too old removes it.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Type-erased shared payload
type CachedValue = Arc<dyn Any + Send + Sync>;

/// A stored value and the moment it was written
struct CacheEntry {
    value: CachedValue,
    captured_at: DateTime<Utc>,
}

impl CacheEntry {
    /// An entry is live while `now - captured_at <= ttl`
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        now.signed_duration_since(self.captured_at) > ttl
    }
}

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub entries: usize,
}

/// Short-lived response cache shared by all view controllers
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
}

impl TtlCache {
    /// Creates an empty cache driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Looks up `key`, treating entries older than `ttl` as absent
    ///
    /// An expired entry is removed, so a later read with a larger `ttl` cannot
    /// bring it back. A value stored under a different type is reported as a
    /// miss and left in place.
    ///
    /// The returned `Arc` is shared with the cache; no copy is made.
    pub fn get<T>(&self, key: &str, ttl: Duration) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                None => return self.miss(key),
                Some(entry) if !entry.is_expired(now, ttl) => return self.hit(key, entry),
                Some(_) => {}
            }
        }

        self.recheck_expired(key, now, ttl)
    }

    /// Write-locked second look at an entry the read lock saw as expired
    ///
    /// Another writer may have refreshed the entry between the two locks, in
    /// which case the fresh value is returned instead of being evicted.
    fn recheck_expired<T>(&self, key: &str, now: DateTime<Utc>, ttl: Duration) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now, ttl) => return self.hit(key, entry),
            Some(_) => {
                entries.remove(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key, ttl_ms = ttl.as_millis() as u64, "cache entry expired");
            }
            None => {}
        }
        self.miss(key)
    }

    fn hit<T>(&self, key: &str, entry: &CacheEntry) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        match entry.value.clone().downcast::<T>() {
            Ok(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key, "cache hit");
                Some(value)
            }
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    key,
                    expected = std::any::type_name::<T>(),
                    "cache entry holds a different type"
                );
                None
            }
        }
    }

    fn miss<T>(&self, key: &str) -> Option<Arc<T>> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(key, "cache miss");
        None
    }

    /// Stores `value` under `key`, replacing any previous entry and resetting its age
    pub fn set<T>(&self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.set_shared(key, Arc::new(value));
    }

    /// Stores an already shared value under `key`
    pub fn set_shared<T>(&self, key: impl Into<String>, value: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        let entry = CacheEntry {
            value,
            captured_at: self.clock.now(),
        };
        tracing::trace!(key = %key, "cache set");
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, entry);
    }

    /// Removes a single entry, or every entry when `key` is `None`
    pub fn clear(&self, key: Option<&str>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => {
                tracing::debug!(removed = entries.len(), "cache cleared");
                entries.clear();
            }
        }
    }

    /// Returns the cached value or runs `load` and caches its result
    ///
    /// Failed loads are not cached. Two concurrent misses for the same key
    /// both run their loader; the later write wins.
    pub async fn get_or_insert_with<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(key, ttl) {
            return Ok(value);
        }

        let value = Arc::new(load().await?);
        self.set_shared(key, value.clone());
        Ok(value)
    }

    /// Number of stored entries, including ones that have not been read since expiring
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Key conventions shared by the view controllers
///
/// Each logical request gets its own namespace so distinct requests never
/// collide.
pub mod keys {
    /// Single-coin detail: `coin:<id>`
    pub fn coin(id: &str) -> String {
        format!("coin:{id}")
    }

    /// Historical price series: `chart:<id>:<days>`
    pub fn chart(id: &str, days: u32) -> String {
        format!("chart:{id}:{days}")
    }

    /// Market listing page: `markets:<page>:<per_page>[:<query>]`
    pub fn markets(page: u32, per_page: u32, query: Option<&str>) -> String {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => format!("markets:{page}:{per_page}:{query}"),
            None => format!("markets:{page}:{per_page}"),
        }
    }

    /// Market data for a batch of favorites: `fav-coins:<id,id,...>`
    pub fn fav_coins(ids: &[String]) -> String {
        format!("fav-coins:{}", ids.join(","))
    }
}
