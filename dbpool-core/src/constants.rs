//! Defaults and environment variable names for DBPOOL.

// ═══════════════════════════════════════════════════════════════════════════════
// EXPIRATION DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live for entries stored without an explicit TTL (30 minutes).
pub const DEFAULT_TTL_MS: u64 = 30 * 60 * 1000;

/// Default period of the background sweeper (1 minute).
/// Zero disables the sweeper entirely.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60 * 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Overrides [`DEFAULT_TTL_MS`].
pub const ENV_DEFAULT_TTL_MS: &str = "DBPOOL_DEFAULT_TTL_MS";

/// Overrides [`DEFAULT_SWEEP_INTERVAL_MS`].
pub const ENV_SWEEP_INTERVAL_MS: &str = "DBPOOL_SWEEP_INTERVAL_MS";
