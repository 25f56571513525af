//! Error types for DBPOOL.
//!
//! Two kinds of failure exist: [`PoolError`] is returned to callers, while
//! [`CloseError`] comes back from a resource handle and is only ever reported.

use std::fmt;

use thiserror::Error;

/// Result type alias using `PoolError`.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Main error type for cache operations.
#[derive(Debug, Error)]
pub enum PoolError {
    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUP ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// No entry is stored under the given key.
    #[error("key not found: {0}")]
    NotFound(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A background sweeper was requested but no Tokio runtime is active.
    #[error("background sweeper requires a running Tokio runtime")]
    NoRuntime,

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PoolError {
    /// Returns true if this is a missing-key error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PoolError::NotFound(_))
    }
}

/// Failure reported by [`ResourceHandle::close`](crate::traits::ResourceHandle::close).
///
/// The cache never propagates this; it is logged and counted.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CloseError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CloseError {
    /// Creates a close error from a message.
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
            source: None,
        }
    }

    /// Wraps an underlying driver error.
    pub fn from_source<E>(message: impl fmt::Display, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the message without the source chain.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for CloseError {
    fn from(err: std::io::Error) -> Self {
        Self::from_source(format!("I/O error: {err}"), err)
    }
}
