//! # DBPOOL Core
//!
//! Core types, errors, and traits for the DBPOOL expiring handle cache.
//!
//! This crate provides the building blocks shared by the cache and its tools:
//!
//! - **Types**: TTL selection, eviction reasons, statistics snapshots
//! - **Errors**: [`PoolError`] for callers, [`CloseError`] for handles
//! - **Constants**: Default lifetimes and environment variable names
//! - **Traits**: [`ResourceHandle`] and [`EvictionObserver`]
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use dbpool_core::Ttl;
//!
//! // A zero TTL falls back to the cache default
//! assert_eq!(Ttl::from(Duration::ZERO).resolve(Duration::from_secs(5)), Some(Duration::from_secs(5)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{CloseError, PoolError, Result};
pub use traits::*;
pub use types::*;
