//! Reasons a handle leaves the cache.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a stored handle was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// Explicit delete by a caller.
    Deleted,
    /// Removed by the sweeper or a purge after its TTL passed.
    Expired,
    /// Overwritten by a newer handle under the same key.
    Replaced,
    /// Removed by a clear-all.
    Cleared,
    /// Closed because the cache itself was dropped.
    Dropped,
}

impl EvictionReason {
    /// Stable lowercase name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Deleted => "deleted",
            EvictionReason::Expired => "expired",
            EvictionReason::Replaced => "replaced",
            EvictionReason::Cleared => "cleared",
            EvictionReason::Dropped => "dropped",
        }
    }
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
