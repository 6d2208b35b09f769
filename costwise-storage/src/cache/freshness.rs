//! Freshness contracts for cost index reads.
//!
//! A record is fresh while its age is at most the freshness window. Callers
//! that would rather get stale data than an error must say so explicitly
//! with [`StaleFallback::Allow`].

use chrono::Duration;
use costwise_core::Timestamp;

/// Default freshness window: seven days.
pub const DEFAULT_FRESHNESS_WINDOW_DAYS: i64 = 7;

/// Maximum age a cached record may reach before it is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    window: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            window: Duration::days(DEFAULT_FRESHNESS_WINDOW_DAYS),
        }
    }
}

impl FreshnessPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// `now - last_refreshed <= window`. A record stamped in the future
    /// counts as fresh.
    pub fn is_fresh(&self, last_refreshed: Timestamp, now: Timestamp) -> bool {
        now.signed_duration_since(last_refreshed) <= self.window
    }
}

/// What to do when a refresh is needed and the pricing source fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleFallback {
    /// Surface the upstream failure.
    #[default]
    Reject,
    /// Serve the stale record if one exists, flagged as stale.
    Allow,
}

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Fresh record from the store; no upstream call.
    Cache,
    /// Record refreshed from the pricing source during this read.
    Upstream,
    /// Stale record served after an upstream failure, by caller request.
    Stale,
}

impl ReadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadSource::Cache => "hit",
            ReadSource::Upstream => "refresh",
            ReadSource::Stale => "stale",
        }
    }
}

/// Result of a cache read, carrying where the value came from.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
}

impl<T> CacheRead<T> {
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
        }
    }

    pub fn from_upstream(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Upstream,
        }
    }

    pub fn stale(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Stale,
        }
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    pub fn is_stale(&self) -> bool {
        self.source == ReadSource::Stale
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
