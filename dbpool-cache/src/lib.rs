//! Expiring cache of database handles.
//!
//! Keys map to singleton handles with sliding TTLs. Expired entries are
//! hidden from lookups immediately and closed by a periodic background
//! sweeper. Every handle the cache takes ownership of is closed exactly once.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use dbpool_cache::ExpiringCache;
//!
//! let cache = ExpiringCache::new(Duration::from_secs(1800), Duration::from_secs(60))?;
//! cache.set("reporting", connect_reporting_db()?, Duration::ZERO);
//! if let Some(db) = cache.get("reporting") {
//!     run_report(&db)?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod config;
mod counters;
mod entry;
mod sweeper;

#[cfg(test)]
mod testing;

pub use cache::ExpiringCache;
pub use config::CacheConfig;

pub use dbpool_core::{
    CacheStats, CloseError, EntryInfo, EvictionObserver, EvictionReason, PoolError,
    ResourceHandle, Result, TracingObserver, Ttl,
};
