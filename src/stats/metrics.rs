//! Statistics for data sources

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::Instant;

use crate::source::{SourceEntry, TimerStatus};

/// Source-level statistics
#[derive(Debug, Clone)]
pub struct SourceStats {
    /// Data source key
    pub key: String,
    /// Refresh interval
    pub interval: Duration,
    /// Current timer status
    pub status: TimerStatus,
    /// How long the outstanding fetch has been running (None when Idle)
    pub busy_for: Option<Duration>,
    /// Fetches started
    pub fetches_started: u64,
    /// Values delivered
    pub updates_delivered: u64,
    /// Fetches that ended without a value (dropped completion or timeout)
    pub fetches_abandoned: u64,
    /// Ticks skipped because a fetch was outstanding
    pub ticks_skipped: u64,
    /// When the last value was delivered
    pub last_updated: Option<Instant>,
    /// Whether a value is currently cached
    pub cached: bool,
    /// Number of listeners for this key
    pub listener_count: usize,
}

impl SourceStats {
    pub(crate) fn from_entry<V>(
        entry: &SourceEntry<V>,
        cached: bool,
        listener_count: usize,
    ) -> Self {
        Self {
            key: entry.key().to_string(),
            interval: entry.interval(),
            status: entry.status(),
            busy_for: entry.busy_for(),
            fetches_started: entry.fetches_started.load(Ordering::Relaxed),
            updates_delivered: entry.updates_delivered.load(Ordering::Relaxed),
            fetches_abandoned: entry.fetches_abandoned.load(Ordering::Relaxed),
            ticks_skipped: entry.ticks_skipped.load(Ordering::Relaxed),
            last_updated: entry.last_updated(),
            cached,
            listener_count,
        }
    }

    /// Whether the source has been Busy for longer than `threshold`
    ///
    /// A fetch that never completes shows up here; with no fetch timeout
    /// configured it stays stalled forever.
    pub fn is_stalled(&self, threshold: Duration) -> bool {
        self.busy_for.is_some_and(|busy| busy > threshold)
    }

    /// Time since the last delivered value
    pub fn age(&self) -> Option<Duration> {
        self.last_updated.map(|at| at.elapsed())
    }
}

/// Engine-wide statistics
#[derive(Debug, Clone, Default)]
pub struct FundamentStats {
    /// Registered sources
    pub source_count: usize,
    /// Sources currently Busy
    pub busy_sources: usize,
    /// Cached values
    pub cached_values: usize,
    /// Listeners across all keys
    pub listener_count: usize,
    /// Fetches started across all sources
    pub fetches_started: u64,
    /// Values delivered across all sources
    pub updates_delivered: u64,
}

impl FundamentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_source(&mut self, source: &SourceStats) {
        self.source_count += 1;
        if source.status == TimerStatus::Busy {
            self.busy_sources += 1;
        }
        self.fetches_started += source.fetches_started;
        self.updates_delivered += source.updates_delivered;
    }
}
