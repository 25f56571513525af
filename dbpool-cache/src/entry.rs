//! Stored entries and their expiration bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use dbpool_core::types::EntryInfo;

/// Cache entry with a sliding TTL.
///
/// `expires_at` is `None` when `ttl` is `None`, or when `ttl` reaches past
/// the clock's range; both mean the entry never expires.
pub(crate) struct CacheEntry<H> {
    handle: Arc<H>,
    expires_at: Option<Instant>,
    ttl: Option<Duration>,
    created_at: DateTime<Utc>,
}

impl<H> CacheEntry<H> {
    pub(crate) fn new(handle: Arc<H>, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            handle,
            expires_at: expiry(now, ttl),
            ttl,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    /// Restarts the expiration window from `now`.
    pub(crate) fn refresh(&mut self, now: Instant) {
        self.expires_at = expiry(now, self.ttl);
        self.created_at = Utc::now();
    }

    pub(crate) fn handle(&self) -> &Arc<H> {
        &self.handle
    }

    pub(crate) fn into_handle(self) -> Arc<H> {
        self.handle
    }

    pub(crate) fn info(&self, key: &str, now: Instant) -> EntryInfo {
        EntryInfo {
            key: key.to_string(),
            created_at: self.created_at,
            ttl_ms: self.ttl.map(as_millis),
            remaining_ms: self
                .expires_at
                .map(|at| as_millis(at.saturating_duration_since(now))),
            expired: self.is_expired_at(now),
        }
    }
}

fn expiry(now: Instant, ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| now.checked_add(ttl))
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Option<Duration>, now: Instant) -> CacheEntry<u8> {
        CacheEntry::new(Arc::new(7), ttl, now)
    }

    #[test]
    fn test_never_expires() {
        let now = Instant::now();
        let e = entry(None, now);
        assert!(!e.is_expired_at(now + Duration::from_secs(86_400)));

        let info = e.info("k", now);
        assert_eq!(info.ttl_ms, None);
        assert_eq!(info.remaining_ms, None);
        assert!(!info.expired);
    }

    #[test]
    fn test_expiry_is_strict() {
        let now = Instant::now();
        let e = entry(Some(Duration::from_millis(50)), now);

        assert!(!e.is_expired_at(now + Duration::from_millis(50)));
        assert!(e.is_expired_at(now + Duration::from_millis(51)));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let now = Instant::now();
        let mut e = entry(Some(Duration::MAX), now);
        assert!(!e.is_expired_at(now + Duration::from_secs(86_400)));

        e.refresh(now + Duration::from_secs(1));
        let info = e.info("k", now);
        assert_eq!(info.ttl_ms, Some(u64::MAX));
        assert_eq!(info.remaining_ms, None);
        assert!(!info.expired);
    }

    #[test]
    fn test_refresh_moves_window() {
        let now = Instant::now();
        let mut e = entry(Some(Duration::from_millis(50)), now);

        let later = now + Duration::from_millis(40);
        e.refresh(later);

        assert!(!e.is_expired_at(now + Duration::from_millis(80)));
        assert!(e.is_expired_at(later + Duration::from_millis(51)));
        assert_eq!(e.info("k", later).remaining_ms, Some(50));
    }
}
