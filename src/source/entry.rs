//! Source entry and timer status

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::completion::DataSource;

/// Whether a source currently has a fetch in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// No fetch outstanding; the next tick may start one
    Idle,
    /// A fetch is outstanding; ticks are skipped
    Busy,
}

#[derive(Debug)]
struct StatusCell {
    status: TimerStatus,
    busy_since: Option<Instant>,
    last_updated: Option<Instant>,
}

/// Entry for a single data source
pub struct SourceEntry<V> {
    key: String,
    source: Arc<dyn DataSource<V>>,
    interval: Duration,
    status: Mutex<StatusCell>,

    /// Set once the source is removed; no new fetch starts after this
    retired: AtomicBool,

    /// Recurring timer task
    timer: Mutex<Option<JoinHandle<()>>>,

    /// Serializes cache write and notification for this key
    delivery: Mutex<()>,

    pub(crate) fetches_started: AtomicU64,
    pub(crate) updates_delivered: AtomicU64,
    pub(crate) ticks_skipped: AtomicU64,
    pub(crate) fetches_abandoned: AtomicU64,

    created_at: Instant,
}

impl<V> SourceEntry<V> {
    /// Create an idle entry
    pub fn new(key: impl Into<String>, source: Arc<dyn DataSource<V>>, interval: Duration) -> Self {
        Self {
            key: key.into(),
            source,
            interval,
            status: Mutex::new(StatusCell {
                status: TimerStatus::Idle,
                busy_since: None,
                last_updated: None,
            }),
            retired: AtomicBool::new(false),
            timer: Mutex::new(None),
            delivery: Mutex::new(()),
            fetches_started: AtomicU64::new(0),
            updates_delivered: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            fetches_abandoned: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    /// Data source key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Refresh interval fixed at registration
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The fetch function
    pub fn source(&self) -> &Arc<dyn DataSource<V>> {
        &self.source
    }

    /// Current timer status
    pub fn status(&self) -> TimerStatus {
        self.lock_status().status
    }

    /// How long the current fetch has been outstanding
    pub fn busy_for(&self) -> Option<Duration> {
        self.lock_status().busy_since.map(|since| since.elapsed())
    }

    /// When a value was last delivered
    pub fn last_updated(&self) -> Option<Instant> {
        self.lock_status().last_updated
    }

    /// When the entry was registered
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether the source has been removed
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Idle -> Busy transition
    ///
    /// Returns false (and counts a skipped tick) if a fetch is already
    /// outstanding or the source was removed.
    pub(crate) fn try_begin_fetch(&self) -> bool {
        if self.is_retired() {
            return false;
        }

        let mut cell = self.lock_status();
        if cell.status == TimerStatus::Busy {
            self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        cell.status = TimerStatus::Busy;
        cell.busy_since = Some(Instant::now());
        self.fetches_started.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Busy -> Idle after a delivered value
    pub(crate) fn finish_fetch(&self) {
        let mut cell = self.lock_status();
        cell.status = TimerStatus::Idle;
        cell.busy_since = None;
        cell.last_updated = Some(Instant::now());
        self.updates_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Busy -> Idle without a value (dropped completion or timeout)
    pub(crate) fn abandon_fetch(&self) {
        let mut cell = self.lock_status();
        cell.status = TimerStatus::Idle;
        cell.busy_since = None;
        self.fetches_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn lock_delivery(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_timer(&self, handle: JoinHandle<()>) {
        let previous = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Mark removed and stop the timer
    ///
    /// An in-flight fetch is not cancelled; its result is discarded.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
        if let Some(handle) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, StatusCell> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Completion;

    fn entry() -> SourceEntry<i32> {
        let source: Arc<dyn DataSource<i32>> = Arc::new(|done: Completion<i32>| done.complete(1));
        SourceEntry::new("temp", source, Duration::from_secs(1))
    }

    #[test]
    fn test_created_idle() {
        let entry = entry();

        assert_eq!(entry.status(), TimerStatus::Idle);
        assert!(entry.busy_for().is_none());
        assert!(entry.last_updated().is_none());
    }

    #[test]
    fn test_busy_blocks_second_fetch() {
        let entry = entry();

        assert!(entry.try_begin_fetch());
        assert_eq!(entry.status(), TimerStatus::Busy);
        assert!(!entry.try_begin_fetch());
        assert_eq!(entry.ticks_skipped.load(Ordering::Relaxed), 1);

        entry.finish_fetch();
        assert_eq!(entry.status(), TimerStatus::Idle);
        assert!(entry.last_updated().is_some());
        assert!(entry.try_begin_fetch());
    }

    #[test]
    fn test_abandon_returns_to_idle_without_update() {
        let entry = entry();

        assert!(entry.try_begin_fetch());
        entry.abandon_fetch();
        assert_eq!(entry.status(), TimerStatus::Idle);
        assert!(entry.last_updated().is_none());
        assert_eq!(entry.fetches_abandoned.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_retired_never_starts() {
        let entry = entry();
        entry.retire();

        assert!(entry.is_retired());
        assert!(!entry.try_begin_fetch());
    }
}
