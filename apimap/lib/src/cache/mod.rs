//! Short-TTL response cache.
//!
//! The cache is an explicit object, built once at startup and shared by every
//! dispatcher that should see the same entries. Expiry is lazy: an entry is
//! checked, and evicted if stale, when it is read. An optional background
//! sweeper additionally drops stale entries on a fixed interval.
//!
//! ## Examples
//!
//! ```rust
//! use std::time::Duration;
//! use apimap_lib::cache::{CacheConfig, ResponseCache};
//! use serde_json::json;
//!
//! let cache = ResponseCache::new(CacheConfig::default());
//! cache.set("getUser:{\"id\":1}", json!({"id": 1}), Some(Duration::from_secs(3)));
//! assert_eq!(cache.get("getUser:{\"id\":1}"), Some(json!({"id": 1})));
//!
//! cache.delete_by_endpoint("getUser");
//! assert!(cache.is_empty());
//! ```

mod key;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::params::ParamSet;

pub use key::cache_key;
use key::endpoint_prefix;

/// Default time-to-live for cached responses.
const DEFAULT_TTL_MS: u64 = 3_000;

/// Default interval between background sweeps.
const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60_000;

/// Cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied when an endpoint does not specify its own, in milliseconds.
    pub default_ttl_ms: u64,
    /// Interval between background sweeps, in milliseconds.
    pub cleanup_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

/// How an endpoint's successful responses are cached.
///
/// Only GET endpoints consult the cache at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Cache for the cache's configured default TTL.
    #[default]
    Default,
    /// Cache for a specific TTL.
    Ttl(Duration),
    /// Cache until explicitly invalidated.
    NoExpiry,
    /// Never cache.
    Disabled,
}

impl CachePolicy {
    /// Resolves the TTL to store an entry with.
    ///
    /// Returns `None` when nothing should be cached, `Some(None)` for an
    /// entry that never expires.
    pub fn store_ttl(&self, default_ttl: Duration) -> Option<Option<Duration>> {
        match self {
            Self::Default => Some(Some(default_ttl)),
            Self::Ttl(ttl) => Some(Some(*ttl)),
            Self::NoExpiry => Some(None),
            Self::Disabled => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    /// `None` means the entry never expires.
    expiry: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expiry.is_some_and(|expiry| now >= expiry)
    }
}

type Entries = Arc<Mutex<HashMap<String, CacheEntry>>>;

/// Thread-safe TTL cache of validated responses.
///
/// Entries are independent, so a single mutex around the map is enough for
/// concurrent dispatches; no lock is held across an await point.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Entries,
    config: CacheConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            config,
            sweeper: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// TTL used by endpoints with [`CachePolicy::Default`].
    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        lock_entries(&self.entries)
    }

    /// Returns the cached value for `key`, evicting it if it has expired.
    ///
    /// A miss is never an error.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;

        if entry.is_expired(Instant::now()) {
            entries.remove(key);
            debug!(cache.key = key, "cache entry expired");
            return None;
        }

        Some(entry.data.clone())
    }

    /// Stores `value` under `key`.
    ///
    /// A `None` TTL stores an entry that lives until it is explicitly removed.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        let expiry = ttl.map(|ttl| Instant::now() + ttl);
        self.lock().insert(key.into(), CacheEntry { data: value, expiry });
    }

    /// Removes the entry for one call.
    pub fn delete(&self, endpoint: &str, params: &ParamSet) -> bool {
        self.lock().remove(&cache_key(endpoint, params)).is_some()
    }

    /// Removes every entry belonging to `endpoint`. Returns how many were removed.
    pub fn delete_by_endpoint(&self, endpoint: &str) -> usize {
        let prefix = endpoint_prefix(endpoint);
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - entries.len();
        debug!(api.endpoint = endpoint, removed, "invalidated endpoint cache");
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every expired entry now. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        purge(&self.entries)
    }

    /// Starts the background sweeper on the current tokio runtime.
    ///
    /// Calling this while a sweeper is already running does nothing. Returns
    /// `true` if a sweeper is running afterwards; `false` when called outside
    /// a runtime or with a zero cleanup interval.
    pub fn start_sweeper(&self) -> bool {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return true;
        }

        let period = self.config.cleanup_interval();
        if period.is_zero() {
            warn!("cache sweeper not started: cleanup interval is zero");
            return false;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("cache sweeper not started: no tokio runtime");
            return false;
        };

        let entries = Arc::clone(&self.entries);
        *sweeper = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = purge(&entries);
                if removed > 0 {
                    debug!(removed, "cache sweep removed expired entries");
                }
            }
        }));
        true
    }

    /// Stops the background sweeper. Calling it when none runs does nothing.
    pub fn stop_sweeper(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ResponseCache {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

fn lock_entries(entries: &Entries) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    // A panic while holding the lock cannot leave an entry half-written.
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

fn purge(entries: &Entries) -> usize {
    let now = Instant::now();
    let mut entries = lock_entries(entries);
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    before - entries.len()
}
