//! Per-source refresh scheduling
//!
//! Every registered source gets one recurring timer task. A tick starts a
//! fetch only if the source is Idle; otherwise it is skipped (no queueing).
//! The fetch runs in its own task so the timer keeps ticking while a fetch
//! is outstanding.
//!
//! ```text
//!   timer task (per key)            fetch task (per fetch)
//!   ────────────────────            ──────────────────────
//!   tick ─► try_begin_fetch ──────► source.fetch(completion)
//!   tick ─► Busy, skipped             await completion [timeout]
//!   tick ─► Busy, skipped             cache.put / Idle / notify
//!   tick ─► try_begin_fetch ──────► ...
//! ```
//!
//! A fetch that never completes leaves its source Busy for good unless a
//! fetch timeout is configured; [`crate::SourceStats::busy_for`] exposes how
//! long that has been the case.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::cache::ResultCache;
use crate::observer::ObserverRegistry;
use crate::source::{Completion, SourceEntry};

/// Drives fetches for registered sources
pub struct Scheduler<V> {
    runtime: Handle,
    cache: Arc<ResultCache<V>>,
    observers: Arc<ObserverRegistry<V>>,
    fetch_timeout: Option<Duration>,
    fire_immediately: bool,
}

impl<V> Scheduler<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a scheduler spawning onto `runtime`
    pub fn new(
        runtime: Handle,
        cache: Arc<ResultCache<V>>,
        observers: Arc<ObserverRegistry<V>>,
        fetch_timeout: Option<Duration>,
        fire_immediately: bool,
    ) -> Self {
        Self {
            runtime,
            cache,
            observers,
            fetch_timeout,
            fire_immediately,
        }
    }

    /// Start the recurring timer for a source
    ///
    /// The first tick fires after one interval, or right away when
    /// `fire_immediately` is set.
    pub fn start(self: &Arc<Self>, entry: &Arc<SourceEntry<V>>) {
        let scheduler = Arc::clone(self);
        let timer_entry = Arc::clone(entry);
        let period = entry.interval();
        let fire_immediately = self.fire_immediately;

        let handle = self.runtime.spawn(async move {
            let start = if fire_immediately {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if timer_entry.is_retired() {
                    break;
                }
                scheduler.tick(&timer_entry);
            }
        });
        entry.set_timer(handle);

        tracing::debug!(
            key = %entry.key(),
            interval_ms = period.as_millis() as u64,
            fire_immediately,
            "Timer started"
        );
    }

    /// Stop a source's timer
    ///
    /// An in-flight fetch keeps running; its result is dropped on arrival.
    pub fn stop(&self, entry: &SourceEntry<V>) {
        entry.retire();
        tracing::debug!(key = %entry.key(), "Timer stopped");
    }

    /// Run one fetch cycle if the source is Idle
    ///
    /// Returns true if a fetch was started.
    pub fn tick(self: &Arc<Self>, entry: &Arc<SourceEntry<V>>) -> bool {
        if !entry.try_begin_fetch() {
            tracing::trace!(key = %entry.key(), status = ?entry.status(), "Tick skipped");
            return false;
        }

        let scheduler = Arc::clone(self);
        let entry = Arc::clone(entry);
        self.runtime.spawn(async move {
            scheduler.run_fetch(entry).await;
        });
        true
    }

    async fn run_fetch(&self, entry: Arc<SourceEntry<V>>) {
        let (completion, rx) = Completion::channel();

        tracing::debug!(key = %entry.key(), "Fetch started");
        entry.source().fetch(completion);

        let outcome = match self.fetch_timeout {
            Some(timeout) => match time::timeout(timeout, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(
                        key = %entry.key(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Fetch timed out"
                    );
                    entry.abandon_fetch();
                    return;
                }
            },
            None => rx.await,
        };

        match outcome {
            Ok(value) => self.deliver(&entry, value),
            Err(_) => {
                tracing::debug!(key = %entry.key(), "Fetch finished without a value");
                entry.abandon_fetch();
            }
        }
    }

    /// Write the cache, return to Idle, then notify listeners
    ///
    /// Holds the entry's delivery lock so notifications for one key arrive
    /// in completion order. The retired check runs under the cache write
    /// lock, so a removal racing with this delivery never leaves the value
    /// behind in the cache.
    fn deliver(&self, entry: &SourceEntry<V>, value: V) {
        let _delivery = entry.lock_delivery();

        let admitted = !entry.is_retired()
            && self
                .cache
                .put_if(entry.key(), value.clone(), || !entry.is_retired());
        if !admitted {
            tracing::debug!(key = %entry.key(), "Late fetch result dropped");
            return;
        }

        entry.finish_fetch();
        let notified = self.observers.notify(entry.key(), &value);

        tracing::debug!(key = %entry.key(), listeners = notified, "Update delivered");
    }
}
