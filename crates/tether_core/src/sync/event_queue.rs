//! # Event Queue
//!
//! Unbounded FIFO between the UI thread (any number of producers) and the
//! execution loop (exactly one consumer per run).
//!
//! ```text
//!   UI thread     ──┐
//!   Input thread  ──┼──> [Mutex<VecDeque>] ──drain_all()──> Execution loop
//!   stop()        ──┘        + Condvar          (once per iteration)
//! ```
//!
//! Producers hold the lock only for a `push_back`. There is no capacity limit
//! and therefore no failure mode: the loop drains every iteration, and
//! redundant resizes are collapsed by [`coalesce_resizes`] before they are
//! applied.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::event::Event;

/// Typical depth between two drains; the deque grows past it if needed.
const INITIAL_CAPACITY: usize = 64;

/// Snapshot of queue counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Events pushed since creation.
    pub pushed: u64,
    /// Events handed to the consumer since creation.
    pub drained: u64,
    /// Resize events dropped by coalescing.
    pub coalesced: u64,
    /// Events currently waiting.
    pub pending: usize,
}

/// Thread-safe ordered event queue.
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
    not_empty: Condvar,
    pushed: AtomicU64,
    drained: AtomicU64,
    coalesced: AtomicU64,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(INITIAL_CAPACITY)),
            not_empty: Condvar::new(),
            pushed: AtomicU64::new(0),
            drained: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Appends an event. Never waits on the consumer.
    pub fn push(&self, event: Event) {
        {
            let mut events = self.events.lock();
            events.push_back(event);
        }
        self.pushed.fetch_add(1, Ordering::Relaxed);
        self.not_empty.notify_one();
    }

    /// Removes and returns every event queued so far, oldest first.
    ///
    /// Everything a producer wrote before its `push` is visible to the caller
    /// once the pushed event is returned here (the queue lock orders them).
    #[must_use]
    pub fn drain_all(&self) -> Vec<Event> {
        let drained: Vec<Event> = {
            let mut events = self.events.lock();
            events.drain(..).collect()
        };
        self.drained.fetch_add(drained.len() as u64, Ordering::Relaxed);
        drained
    }

    /// Blocks until at least one event is queued or `timeout` elapses.
    ///
    /// Returns true if events are waiting. Used by the loop to sleep between
    /// frames without missing a push.
    pub fn wait_for_events(&self, timeout: Duration) -> bool {
        let mut events = self.events.lock();
        if events.is_empty() && !timeout.is_zero() {
            let _ = self.not_empty.wait_for(&mut events, timeout);
        }
        !events.is_empty()
    }

    /// Removes queued events matching `pred`, keeping the order of the rest.
    ///
    /// Returns how many were removed.
    pub fn purge<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&Event) -> bool,
    {
        let mut events = self.events.lock();
        let before = events.len();
        events.retain(|event| !pred(event));
        before - events.len()
    }

    /// Records resize events dropped by the consumer's coalescing pass.
    pub fn record_coalesced(&self, count: usize) {
        if count > 0 {
            self.coalesced.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    /// Number of events waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Returns the counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            pending: self.len(),
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Collapses runs of `SurfaceChanged` into the last one of each run.
///
/// A run ends at any event that changes which surface is bound
/// (`SurfaceCreated`, `SurfaceDestroyed`) or at `Stop`; other events in
/// between do not break it. Relative order of everything kept is unchanged.
///
/// Returns the surviving events and how many were dropped.
#[must_use]
pub fn coalesce_resizes(events: Vec<Event>) -> (Vec<Event>, usize) {
    let mut kept = Vec::with_capacity(events.len());
    let mut dropped = 0;
    let mut later_resize_in_run = false;

    for event in events.into_iter().rev() {
        if event.is_surface_boundary() {
            later_resize_in_run = false;
        } else if matches!(event, Event::SurfaceChanged(_)) {
            if later_resize_in_run {
                dropped += 1;
                continue;
            }
            later_resize_in_run = true;
        }
        kept.push(event);
    }

    kept.reverse();
    (kept, dropped)
}
