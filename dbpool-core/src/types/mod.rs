//! Domain types for DBPOOL.
//!
//! - [`Ttl`]: how long an entry lives without being accessed
//! - [`EvictionReason`]: why a handle left the cache
//! - [`CacheStats`] / [`EntryInfo`]: introspection snapshots

mod ttl;
mod eviction;
mod stats;

pub use ttl::*;
pub use eviction::*;
pub use stats::*;
