//! Time-to-live selection for cache entries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Requested lifetime of an entry.
///
/// Lifetimes are sliding: every successful lookup restarts the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ttl {
    /// Use the cache's default TTL.
    #[default]
    Default,
    /// Never expire, whatever the default is.
    Never,
    /// Expire after this much idle time. A zero duration means [`Ttl::Default`].
    After(Duration),
}

impl Ttl {
    /// Resolves to a concrete window, or `None` for never-expire.
    ///
    /// A zero default means entries stored with [`Ttl::Default`] never expire.
    pub fn resolve(self, default_ttl: Duration) -> Option<Duration> {
        match self {
            Ttl::Never => None,
            Ttl::After(ttl) if !ttl.is_zero() => Some(ttl),
            Ttl::Default | Ttl::After(_) => (!default_ttl.is_zero()).then_some(default_ttl),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Ttl::Default
        } else {
            Ttl::After(ttl)
        }
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Ttl::Default, Ttl::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test_case(Ttl::Default, 0 => None; "default with zero default never expires")]
    #[test_case(Ttl::Default, 500 => Some(ms(500)); "default picks up configured ttl")]
    #[test_case(Ttl::After(ms(0)), 500 => Some(ms(500)); "zero explicit ttl falls back to default")]
    #[test_case(Ttl::After(ms(0)), 0 => None; "zero explicit and zero default never expire")]
    #[test_case(Ttl::After(ms(50)), 500 => Some(ms(50)); "explicit ttl wins")]
    #[test_case(Ttl::Never, 500 => None; "never ignores default")]
    fn test_resolve(ttl: Ttl, default_ms: u64) -> Option<Duration> {
        ttl.resolve(ms(default_ms))
    }

    #[test]
    fn test_from_duration() {
        assert_eq!(Ttl::from(Duration::ZERO), Ttl::Default);
        assert_eq!(Ttl::from(ms(5)), Ttl::After(ms(5)));
        assert_eq!(Ttl::from(None), Ttl::Default);
        assert_eq!(Ttl::from(Some(ms(5))), Ttl::After(ms(5)));
    }
}
