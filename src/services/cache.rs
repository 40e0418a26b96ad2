// src/services/cache.rs
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as KeyLock;

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// In-memory map whose entries go stale after a caller-supplied TTL.
///
/// Entries are only ever replaced by a successful refresh. A failed fetch
/// leaves the map untouched, so the next call tries the provider again.
/// Concurrent misses on one key share a single fetch.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    inflight: Mutex<HashMap<K, Arc<KeyLock<()>>>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self::with_clock(name, Arc::new(SystemClock))
    }

    pub fn with_clock(name: &'static str, clock: Arc<dyn Clock>) -> Self {
        TtlCache {
            name,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn key_lock(&self, key: &K) -> Arc<KeyLock<()>> {
        let mut inflight = self.inflight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inflight.entry(key.clone()).or_default().clone()
    }

    /// Returns the stored value if it is younger than `ttl`.
    pub fn get_fresh(&self, key: &K, ttl: Duration) -> Option<V> {
        let now = self.clock.now();
        self.entries()
            .get(key)
            .filter(|entry| now - entry.fetched_at < ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let fetched_at = self.clock.now();
        self.entries().insert(key, CacheEntry { value, fetched_at });
    }

    /// Serves `key` from memory while fresh, otherwise awaits `fetch` and
    /// stores its result. The map lock is released before `fetch` runs; only
    /// the per-key lock is held, so a second caller waits for the first
    /// fetch instead of starting its own.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, ttl: Duration, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get_fresh(&key, ttl) {
            debug!("{} cache hit for {:?}", self.name, key);
            return Ok(value);
        }

        let lock = self.key_lock(&key);
        let _fetching = lock.lock().await;
        if let Some(value) = self.get_fresh(&key, ttl) {
            debug!("{} cache filled by a concurrent fetch for {:?}", self.name, key);
            return Ok(value);
        }

        info!("{} cache miss or expired for {:?}, fetching", self.name, key);
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
