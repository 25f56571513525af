//! Introspection snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache statistics.
///
/// Counters are cumulative since construction; `entries` and
/// `expired_entries` describe the map at snapshot time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries in the map, including lazily expired ones
    pub entries: usize,
    /// Entries past their expiration but not yet swept
    pub expired_entries: usize,
    /// Lookups that returned a handle
    pub hits: u64,
    /// Lookups for absent keys
    pub misses: u64,
    /// Lookups that found an expired entry
    pub expired_misses: u64,
    /// Stores of a new key
    pub inserts: u64,
    /// Stores that overwrote an existing key
    pub replacements: u64,
    /// Successful explicit deletes
    pub deletions: u64,
    /// Entries removed because they expired
    pub evictions: u64,
    /// Close calls that succeeded
    pub closes: u64,
    /// Close calls that failed
    pub close_failures: u64,
}

impl CacheStats {
    /// Entries that would currently be returned by a lookup.
    pub fn live_entries(&self) -> usize {
        self.entries.saturating_sub(self.expired_entries)
    }

    /// Hit ratio over all lookups, or `None` before the first lookup.
    pub fn hit_ratio(&self) -> Option<f64> {
        let lookups = self.hits + self.misses + self.expired_misses;
        (lookups > 0).then(|| self.hits as f64 / lookups as f64)
    }
}

/// Read-only description of one entry. Does not refresh it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    /// Cache key
    pub key: String,
    /// Last insertion or refresh
    pub created_at: DateTime<Utc>,
    /// Sliding window in milliseconds; `None` never expires
    pub ttl_ms: Option<u64>,
    /// Time left before expiry in milliseconds; `None` never expires
    pub remaining_ms: Option<u64>,
    /// Past expiration but still stored
    pub expired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_entries() {
        let stats = CacheStats {
            entries: 5,
            expired_entries: 2,
            ..Default::default()
        };
        assert_eq!(stats.live_entries(), 3);
    }

    #[test]
    fn test_hit_ratio() {
        assert_eq!(CacheStats::default().hit_ratio(), None);

        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_ratio(), Some(0.75));
    }
}
