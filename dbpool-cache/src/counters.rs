//! Lock-free operation counters behind [`CacheStats`].

use std::sync::atomic::{AtomicU64, Ordering};

use dbpool_core::types::CacheStats;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
    pub(crate) expired_misses: AtomicU64,
    pub(crate) inserts: AtomicU64,
    pub(crate) replacements: AtomicU64,
    pub(crate) deletions: AtomicU64,
    pub(crate) evictions: AtomicU64,
    pub(crate) closes: AtomicU64,
    pub(crate) close_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Fills the cumulative fields; map-derived fields are left to the caller.
    pub(crate) fn snapshot(&self, entries: usize, expired_entries: usize) -> CacheStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CacheStats {
            entries,
            expired_entries,
            hits: load(&self.hits),
            misses: load(&self.misses),
            expired_misses: load(&self.expired_misses),
            inserts: load(&self.inserts),
            replacements: load(&self.replacements),
            deletions: load(&self.deletions),
            evictions: load(&self.evictions),
            closes: load(&self.closes),
            close_failures: load(&self.close_failures),
        }
    }
}
