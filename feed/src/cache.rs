//! Get-or-compute cache with sliding expiration.

use dashmap::DashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use coinfeed_common::constants::CACHE_SLIDING_WINDOW;

/// Cached entry.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, window: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + window,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Expiry distance from the last successful access.
    pub sliding_window: Duration,
    /// Entry count above which expired entries are swept on insert.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sliding_window: CACHE_SLIDING_WINDOW,
            max_entries: 10_000,
        }
    }
}

/// Thread-safe cache-aside store.
///
/// Expired entries are treated as absent on access. Concurrent misses on the
/// same key wait on a per-key guard so the value is computed once. A value
/// whose computation overlapped an invalidation is returned but not stored.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    in_flight: DashMap<K, Arc<Mutex<()>>>,
    generation: AtomicU64,
    config: CacheConfig,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Create a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
            config,
        }
    }

    /// Create a new cache with the given sliding window.
    pub fn with_window(sliding_window: Duration) -> Self {
        Self::with_config(CacheConfig {
            sliding_window,
            ..Default::default()
        })
    }

    /// Get a live value, extending its expiry by the full window.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_live(now) {
                entry.expires_at = now + self.config.sliding_window;
                debug!(key = ?key, "Cache hit");
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
            debug!(key = ?key, "Cache entry expired");
        }

        None
    }

    /// Insert a value, starting a fresh window.
    pub fn insert(&self, key: K, value: V) {
        if self.entries.len() >= self.config.max_entries {
            self.evict_expired();
        }
        self.entries
            .insert(key, CacheEntry::new(value, self.config.sliding_window));
    }

    /// Return the live value for `key`, or run `compute` and cache its result.
    ///
    /// A failed computation is returned to the caller and nothing is cached.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let gate = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock().await;

        // Filled by the caller we waited on.
        let result = match self.get(&key) {
            Some(value) => Ok(value),
            None => {
                debug!(key = ?key, "Cache miss");
                let generation = self.generation.load(Ordering::Acquire);
                let result = compute().await;
                if let Ok(value) = &result {
                    if self.generation.load(Ordering::Acquire) == generation {
                        self.insert(key.clone(), value.clone());
                    } else {
                        debug!(key = ?key, "Invalidated during compute, not caching");
                    }
                }
                result
            }
        };

        drop(guard);
        // The map and `gate` hold two references; more means someone is waiting.
        self.in_flight
            .remove_if(&key, |_, lock| Arc::strong_count(lock) <= 2);

        result
    }

    /// Remove an entry. Computations still running will not store their value.
    pub fn invalidate(&self, key: &K) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.remove(key);
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
    }

    /// Get the number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict expired entries.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let total = self.entries.len();
        let live = self.entries.iter().filter(|e| e.is_live(now)).count();

        CacheStats {
            total_entries: total,
            live_entries: live,
            expired_entries: total - live,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Sweep expired entries every `every` until the cache is dropped.
    pub fn spawn_sweeper(cache: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                cache.evict_expired();
            }
        })
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub live_entries: usize,
    pub expired_entries: usize,
}

/// Shared cache.
pub type SharedTtlCache<K, V> = Arc<TtlCache<K, V>>;
