//! Background task that evicts expired entries on a fixed period.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use dbpool_core::error::{PoolError, Result};
use dbpool_core::traits::ResourceHandle;

use crate::cache::Shared;

/// Longest period the sweeper waits between passes. Larger intervals are
/// capped so tick deadlines stay within the clock's range.
const MAX_PERIOD: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Handle to a running sweeper task.
///
/// Dropping it stops the task at its next wakeup.
#[derive(Debug)]
pub(crate) struct Sweeper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Spawns the sweeper on the ambient Tokio runtime.
    ///
    /// The task holds only a weak reference to the store; once the store is
    /// gone the next tick ends the loop.
    pub(crate) fn spawn<H: ResourceHandle>(shared: &Arc<Shared<H>>, period: Duration) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        let (shutdown, signal) = watch::channel(false);
        let task = runtime.spawn(run(Arc::downgrade(shared), period, signal));

        Ok(Self { shutdown, task })
    }

    /// Signals the task to exit.
    pub(crate) fn stop(self) {
        let _ = self.shutdown.send(true);
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

async fn run<H: ResourceHandle>(
    shared: Weak<Shared<H>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = period.min(MAX_PERIOD);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(period = ?period, "sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                let evicted = shared.sweep();
                if evicted > 0 {
                    debug!(evicted, "sweeper evicted expired entries");
                }
            }
            // Fires on an explicit stop and when the sender is dropped.
            _ = shutdown.changed() => break,
        }
    }

    debug!("sweeper stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use crate::cache::ExpiringCache;
    use crate::testing::{closes, TestConn};
    use dbpool_core::error::PoolError;
    use dbpool_core::types::Ttl;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_requires_runtime() {
        let result = ExpiringCache::<TestConn>::new(ms(100), ms(10));
        assert!(matches!(result, Err(PoolError::NoRuntime)));
    }

    #[test]
    fn test_zero_interval_needs_no_runtime() {
        let cache = ExpiringCache::<TestConn>::new(ms(100), Duration::ZERO).unwrap();
        assert!(!cache.sweeper_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_without_access() {
        let cache = ExpiringCache::new(Duration::ZERO, ms(10)).unwrap();
        let (conn, closed) = TestConn::new(1);
        cache.set("a", conn, ms(5));

        sleep(ms(15)).await;

        assert_eq!(closes(&closed), 1);
        assert!(cache.get_items().is_empty());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_millisecond_durations_stay_enabled() {
        let cache = ExpiringCache::new(Duration::from_micros(500), Duration::from_micros(500)).unwrap();
        assert_eq!(cache.default_ttl(), Duration::from_micros(500));
        assert!(cache.sweeper_running());

        let (conn, closed) = TestConn::new(1);
        cache.set("a", conn, Duration::ZERO);

        sleep(Duration::from_secs(1)).await;

        assert!(cache.get("a").is_none());
        assert_eq!(closes(&closed), 1);
        assert!(cache.get_items().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_and_interval_do_not_overflow() {
        let cache = ExpiringCache::new(Duration::ZERO, Duration::MAX).unwrap();
        let (conn, closed) = TestConn::new(1);
        cache.set("a", conn, Duration::MAX);

        sleep(ms(50)).await;

        assert!(cache.sweeper_running());
        assert_eq!(cache.get("a").unwrap().id, 1);
        assert!(cache.get("a").is_some());
        assert!(cache.expired_keys().is_empty());
        assert_eq!(closes(&closed), 0);

        cache.stop_sweeper();
        assert!(!cache.sweeper_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_keeps_live_entries() {
        let cache = ExpiringCache::new(Duration::ZERO, ms(10)).unwrap();
        let (short, short_closed) = TestConn::new(1);
        let (long, long_closed) = TestConn::new(2);
        cache.set("short", short, ms(5));
        cache.set("long", long, ms(1_000));

        sleep(ms(25)).await;

        assert_eq!(closes(&short_closed), 1);
        assert_eq!(closes(&long_closed), 0);
        assert_eq!(cache.get_items(), vec!["long".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_expire_survives_sweeps() {
        let cache = ExpiringCache::new(Duration::ZERO, ms(10)).unwrap();
        let (conn, closed) = TestConn::new(1);
        cache.set("a", conn, Duration::ZERO);

        sleep(Duration::from_secs(10)).await;

        assert!(cache.get("a").is_some());
        assert_eq!(closes(&closed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_never_with_default_ttl() {
        let cache = ExpiringCache::new(ms(5), ms(10)).unwrap();
        let (conn, closed) = TestConn::new(1);
        cache.set_with_expiry("a", conn, Ttl::Never);

        sleep(ms(100)).await;

        assert!(cache.get("a").is_some());
        assert_eq!(closes(&closed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sliding_refresh_with_sweeper() {
        let cache = ExpiringCache::new(Duration::ZERO, ms(10)).unwrap();
        let (conn, closed) = TestConn::new(1);
        cache.set("a", conn, ms(100));

        for _ in 0..5 {
            sleep(ms(40)).await;
            assert!(cache.get("a").is_some(), "refreshed entry must stay reachable");
        }
        assert_eq!(closes(&closed), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_sweeper() {
        let cache = ExpiringCache::new(Duration::ZERO, ms(10)).unwrap();
        assert!(cache.sweeper_running());

        cache.stop_sweeper();
        let (conn, closed) = TestConn::new(1);
        cache.set("a", conn, ms(5));
        sleep(ms(50)).await;

        assert!(!cache.sweeper_running());
        // Lazily expired: invisible to lookups but still stored and unclosed.
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get_items(), vec!["a".to_string()]);
        assert_eq!(closes(&closed), 0);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(closes(&closed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_closes_remaining_handles() {
        let cache = ExpiringCache::new(Duration::ZERO, ms(10)).unwrap();
        let (conn, closed) = TestConn::new(1);
        cache.set("a", conn, Duration::ZERO);

        drop(cache);
        sleep(ms(20)).await;

        assert_eq!(closes(&closed), 1);
    }
}
