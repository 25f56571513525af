//! Collaborator interfaces for DBPOOL.
//!
//! The cache knows nothing about what it stores beyond [`ResourceHandle`], and
//! reports every release through an [`EvictionObserver`].

use std::sync::Arc;

use tracing::warn;

use crate::error::CloseError;
use crate::types::EvictionReason;

// ═══════════════════════════════════════════════════════════════════════════════
// RESOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A resource the cache can release.
///
/// Implementations wrap a database connection or pool. `close` is called at
/// most once per stored handle, outside of the cache lock, and must return in
/// bounded time: a hanging close stalls the caller or sweeper tick that
/// triggered it.
pub trait ResourceHandle: Send + Sync + 'static {
    /// Releases the underlying resource.
    fn close(&self) -> Result<(), CloseError>;
}

impl<T: ResourceHandle + ?Sized> ResourceHandle for Box<T> {
    fn close(&self) -> Result<(), CloseError> {
        (**self).close()
    }
}

impl<T: ResourceHandle + ?Sized> ResourceHandle for Arc<T> {
    fn close(&self) -> Result<(), CloseError> {
        (**self).close()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OBSERVER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Receives release notifications from the cache.
pub trait EvictionObserver: Send + Sync {
    /// Called after a handle was closed successfully and its entry removed.
    fn on_evicted(&self, _key: &str, _reason: EvictionReason) {}

    /// Called when closing a handle failed. The entry is gone regardless.
    fn on_close_failed(&self, key: &str, reason: EvictionReason, error: &CloseError);
}

/// Default observer: logs close failures at warning level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl EvictionObserver for TracingObserver {
    fn on_close_failed(&self, key: &str, reason: EvictionReason, error: &CloseError) {
        warn!(key, %reason, error = %error, "db connection close error");
    }
}
