//! Expiring cache of database handles.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};
use tokio::time::Instant;
use tracing::debug;

use dbpool_core::error::{PoolError, Result};
use dbpool_core::traits::{EvictionObserver, ResourceHandle, TracingObserver};
use dbpool_core::types::{CacheStats, EntryInfo, EvictionReason, Ttl};

use crate::config::CacheConfig;
use crate::counters::Counters;
use crate::entry::CacheEntry;
use crate::sweeper::Sweeper;

/// State shared between the cache and its sweeper.
pub(crate) struct Shared<H> {
    entries: RwLock<HashMap<String, CacheEntry<H>>>,
    default_ttl: Duration,
    observer: Arc<dyn EvictionObserver>,
    counters: Counters,
}

impl<H: ResourceHandle> Shared<H> {
    fn expired_keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Removes the listed keys that are still expired.
    ///
    /// `keys` is a snapshot from an earlier lock acquisition: keys deleted
    /// since are skipped, and so are keys refreshed or replaced since.
    pub(crate) fn evict_expired(&self, keys: &[String]) -> usize {
        let now = Instant::now();
        let removed: Vec<(String, Arc<H>)> = {
            let mut entries = self.entries.write();
            keys.iter()
                .filter_map(|key| {
                    if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
                        entries.remove_entry(key.as_str())
                    } else {
                        None
                    }
                })
                .map(|(key, entry)| (key, entry.into_handle()))
                .collect()
        };

        let evicted = removed.len();
        Counters::add(&self.counters.evictions, evicted);
        self.release(removed, EvictionReason::Expired);
        evicted
    }

    /// One scan-then-evict pass.
    pub(crate) fn sweep(&self) -> usize {
        let keys = self.expired_keys();
        if keys.is_empty() {
            return 0;
        }
        self.evict_expired(&keys)
    }

    fn drain(&self) -> Vec<(String, Arc<H>)> {
        let drained = std::mem::take(&mut *self.entries.write());
        drained
            .into_iter()
            .map(|(key, entry)| (key, entry.into_handle()))
            .collect()
    }

    /// Closes handles already taken out of the map. Never called under the lock.
    fn release(&self, handles: Vec<(String, Arc<H>)>, reason: EvictionReason) {
        for (key, handle) in handles {
            match handle.close() {
                Ok(()) => {
                    Counters::bump(&self.counters.closes);
                    debug!(key = %key, %reason, "closed handle");
                    self.observer.on_evicted(&key, reason);
                }
                Err(error) => {
                    Counters::bump(&self.counters.close_failures);
                    self.observer.on_close_failed(&key, reason, &error);
                }
            }
        }
    }
}

/// Concurrency-safe cache mapping keys to database handles with sliding TTLs.
///
/// # Locking
///
/// One reader/writer lock guards the whole key space. Enumeration takes a
/// shared lock. [`get`](Self::get) takes an upgradable lock and upgrades on a
/// hit, since a hit refreshes the entry; there is no read-only lookup of
/// handles. Writers are exclusive.
///
/// Handles are always taken out of the map under the lock and closed after it
/// is released, so a slow close delays only the caller that triggered it.
///
/// # Expiration
///
/// Expired entries are invisible to [`get`](Self::get) but stay stored until
/// the sweeper, [`purge_expired`](Self::purge_expired), [`delete`](Self::delete)
/// or [`clear_all`](Self::clear_all) removes and closes them. Enumeration
/// ([`get_items`](Self::get_items), [`len`](Self::len)) reports raw map state,
/// lazily expired keys included.
///
/// # Ownership
///
/// Every stored handle is closed exactly once: on delete, expiry eviction,
/// replacement, clear, or when the cache is dropped. Clones returned by
/// [`get`](Self::get) share the same underlying resource and observe the close.
pub struct ExpiringCache<H: ResourceHandle> {
    shared: Arc<Shared<H>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<H: ResourceHandle> ExpiringCache<H> {
    /// Creates an empty cache.
    ///
    /// A non-zero `sweep_interval` starts the background sweeper, which needs
    /// a running Tokio runtime; without one this fails with
    /// [`PoolError::NoRuntime`].
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Result<Self> {
        Self::build(default_ttl, sweep_interval, Arc::new(TracingObserver))
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Creates a cache that reports releases to `observer`.
    pub fn with_observer(config: CacheConfig, observer: Arc<dyn EvictionObserver>) -> Result<Self> {
        Self::build(config.default_ttl(), config.sweep_interval(), observer)
    }

    fn build(
        default_ttl: Duration,
        sweep_interval: Duration,
        observer: Arc<dyn EvictionObserver>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            observer,
            counters: Counters::default(),
        });

        let sweeper = if sweep_interval.is_zero() {
            None
        } else {
            Some(Sweeper::spawn(&shared, sweep_interval)?)
        };

        Ok(Self {
            shared,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Stores `handle` under `key`. A zero `ttl` uses the default TTL.
    ///
    /// Any handle previously stored under `key` is closed.
    pub fn set(&self, key: &str, handle: H, ttl: Duration) {
        self.set_with_expiry(key, handle, Ttl::from(ttl));
    }

    /// Stores `handle` under `key` with an explicit lifetime.
    pub fn set_with_expiry(&self, key: &str, handle: H, ttl: Ttl) {
        let ttl = ttl.resolve(self.shared.default_ttl);
        let entry = CacheEntry::new(Arc::new(handle), ttl, Instant::now());

        let previous = self.shared.entries.write().insert(key.to_string(), entry);

        debug!(key, ttl = ?ttl, "stored handle");

        match previous {
            Some(old) => {
                Counters::bump(&self.shared.counters.replacements);
                self.shared
                    .release(vec![(key.to_string(), old.into_handle())], EvictionReason::Replaced);
            }
            None => Counters::bump(&self.shared.counters.inserts),
        }
    }

    /// Returns the handle for `key` and restarts its expiration window.
    ///
    /// Returns `None` for absent and expired keys. An expired entry is not
    /// removed here.
    pub fn get(&self, key: &str) -> Option<Arc<H>> {
        let now = Instant::now();
        let entries = self.shared.entries.upgradable_read();

        match entries.get(key) {
            None => {
                Counters::bump(&self.shared.counters.misses);
                return None;
            }
            Some(entry) if entry.is_expired_at(now) => {
                Counters::bump(&self.shared.counters.expired_misses);
                return None;
            }
            Some(_) => {}
        }

        let mut entries = RwLockUpgradableReadGuard::upgrade(entries);
        let entry = entries.get_mut(key)?;
        entry.refresh(now);
        Counters::bump(&self.shared.counters.hits);

        Some(Arc::clone(entry.handle()))
    }

    /// Removes `key` and closes its handle.
    ///
    /// A failed close is reported to the observer, not returned.
    pub fn delete(&self, key: &str) -> Result<()> {
        let removed = self.shared.entries.write().remove(key);
        let Some(entry) = removed else {
            return Err(PoolError::NotFound(key.to_string()));
        };

        Counters::bump(&self.shared.counters.deletions);
        self.shared
            .release(vec![(key.to_string(), entry.into_handle())], EvictionReason::Deleted);
        Ok(())
    }

    /// Returns every stored key, lazily expired ones included.
    pub fn get_items(&self) -> Vec<String> {
        self.shared.entries.read().keys().cloned().collect()
    }

    /// Returns the keys whose expiration has passed.
    pub fn expired_keys(&self) -> Vec<String> {
        self.shared.expired_keys()
    }

    /// Removes and closes all expired entries now. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        self.shared.sweep()
    }

    /// Removes every entry and closes its handle. The cache stays usable.
    pub fn clear_all(&self) {
        let drained = self.shared.drain();
        debug!(count = drained.len(), "clearing cache");
        self.shared.release(drained, EvictionReason::Cleared);
    }

    /// Returns true if `key` is stored, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.shared.entries.read().contains_key(key)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shared.entries.read().is_empty()
    }

    /// Describes every entry without refreshing any of them.
    pub fn describe(&self) -> Vec<EntryInfo> {
        let now = Instant::now();
        self.shared
            .entries
            .read()
            .iter()
            .map(|(key, entry)| entry.info(key, now))
            .collect()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.shared.entries.read();
        let expired = entries.values().filter(|e| e.is_expired_at(now)).count();
        self.shared.counters.snapshot(entries.len(), expired)
    }

    /// Default TTL applied by [`set`](Self::set) when given zero.
    pub fn default_ttl(&self) -> Duration {
        self.shared.default_ttl
    }

    /// Stops the background sweeper. Expired entries then stay until purged.
    pub fn stop_sweeper(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
        }
    }

    /// Returns true while the background sweeper task is alive.
    pub fn sweeper_running(&self) -> bool {
        self.sweeper.lock().as_ref().is_some_and(Sweeper::is_running)
    }
}

impl<H: ResourceHandle> Drop for ExpiringCache<H> {
    fn drop(&mut self) {
        self.stop_sweeper();
        let drained = self.shared.drain();
        self.shared.release(drained, EvictionReason::Dropped);
    }
}

impl<H: ResourceHandle> fmt::Debug for ExpiringCache<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("entries", &self.len())
            .field("default_ttl", &self.shared.default_ttl)
            .field("sweeper_running", &self.sweeper_running())
            .finish()
    }
}
