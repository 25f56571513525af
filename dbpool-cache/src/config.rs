//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use dbpool_core::constants::{
    DEFAULT_SWEEP_INTERVAL_MS, DEFAULT_TTL_MS, ENV_DEFAULT_TTL_MS, ENV_SWEEP_INTERVAL_MS,
};
use dbpool_core::error::{PoolError, Result};

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL in milliseconds for entries stored without one; 0 means never expire
    pub default_ttl_ms: u64,
    /// Sweeper period in milliseconds; 0 disables the sweeper
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration from durations.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            default_ttl_ms: duration_to_ms(default_ttl),
            sweep_interval_ms: duration_to_ms(sweep_interval),
        }
    }

    /// Loads `.env` if present, then reads overrides from the environment.
    ///
    /// Unset variables keep their defaults; unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            default_ttl_ms: parse_ms(&lookup, ENV_DEFAULT_TTL_MS)?.unwrap_or(defaults.default_ttl_ms),
            sweep_interval_ms: parse_ms(&lookup, ENV_SWEEP_INTERVAL_MS)?
                .unwrap_or(defaults.sweep_interval_ms),
        })
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = duration_to_ms(ttl);
        self
    }

    /// Sets the sweeper period.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = duration_to_ms(interval);
        self
    }

    /// Disables the background sweeper.
    pub fn no_sweeper(mut self) -> Self {
        self.sweep_interval_ms = 0;
        self
    }

    /// Default TTL as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Sweeper period as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn parse_ms(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<u64>> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| PoolError::ConfigError(format!("{name}={raw:?}: {e}"))),
    }
}

/// Whole milliseconds, rounding a non-zero sub-millisecond duration up to 1
/// so it keeps meaning "enabled".
fn duration_to_ms(duration: Duration) -> u64 {
    if !duration.is_zero() && duration < Duration::from_millis(1) {
        return 1;
    }
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
