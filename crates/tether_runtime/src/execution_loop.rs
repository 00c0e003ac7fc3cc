//! # Execution Loop
//!
//! Runs on its own thread, one instance per `start()`:
//!
//! ```text
//! loop {
//!     drain_all() -> coalesce resizes -> apply in order   (Stop: settle rest, exit)
//!     announce the bound surface to the driver if it has not seen it
//!     refresh phase (Initializing / Active / Paused)
//!     if a frame is due and Active with a surface: update(dt) -> present()
//!     sleep until the next frame or the next event
//! }
//! settle leftovers -> Terminated
//! ```
//!
//! The loop is the only reader of the queue and the only writer of the
//! surface slot while it runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tether_core::{coalesce_resizes, Event, InputEvent, LifecycleState, Surface};

use crate::config::BridgeConfig;
use crate::driver::FrameDriver;
use crate::error::{BridgeError, BridgeResult, FrameError};
use crate::shared::{SettleReport, SharedBridge};

/// Where the loop is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopPhase {
    /// Constructed, no iteration run yet.
    NotStarted,
    /// Running, waiting for a surface.
    Initializing,
    /// Presenting frames.
    Active,
    /// Host in the background; input still flows, no frames.
    Paused,
    /// Stop observed; settling.
    Stopping,
    /// Done. The thread is about to exit.
    Terminated,
}

impl LoopPhase {
    /// Name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Initializing => "initializing",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Terminated => "terminated",
        }
    }
}

/// What the caller should do after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// Keep going.
    Continue,
    /// Stop was observed.
    Stop,
}

/// Counters for one run, returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Iterations executed.
    pub iterations: u64,
    /// Frames updated and presented successfully.
    pub frames_presented: u64,
    /// Frames that were due but had nowhere to go (paused, no surface).
    pub frames_skipped: u64,
    /// Frames the driver reported as failed.
    pub frames_failed: u64,
    /// Events applied, including surface events settled at exit.
    pub events_applied: u64,
    /// Input and lifecycle events dropped after Stop.
    pub events_discarded: u64,
    /// Resize events collapsed before applying.
    pub resizes_coalesced: u64,
}

/// Keeps the bridge marked live while the loop exists, and settles the
/// queue when it goes away, including on unwind.
struct LiveGuard {
    shared: Arc<SharedBridge>,
    settled: bool,
}

impl LiveGuard {
    fn enter(shared: Arc<SharedBridge>) -> Self {
        shared.set_live();
        Self {
            shared,
            settled: false,
        }
    }

    fn settle(&mut self) -> SettleReport {
        if self.settled {
            return SettleReport::default();
        }
        self.settled = true;
        self.shared.settle_pending()
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        let report = self.settle();
        if report != SettleReport::default() {
            tracing::debug!(
                applied = report.applied,
                discarded = report.discarded,
                "settled queue while dropping execution loop"
            );
        }
    }
}

/// The per-run loop. Create it on the thread that will run it: creation
/// marks the bridge live.
pub struct ExecutionLoop {
    shared: Arc<SharedBridge>,
    guard: LiveGuard,
    driver: Box<dyn FrameDriver>,
    frame_interval: Duration,
    max_delta: Duration,
    max_failures: u32,
    phase: LoopPhase,
    paused: bool,
    lifecycle: LifecycleState,
    redraw_requested: bool,
    announced: Option<u64>,
    last_frame: Option<Instant>,
    consecutive_failures: u32,
    report: LoopReport,
}

impl ExecutionLoop {
    /// Creates a loop over `shared` that drives `driver`.
    pub fn new(
        config: &BridgeConfig,
        shared: Arc<SharedBridge>,
        driver: Box<dyn FrameDriver>,
    ) -> Self {
        let guard = LiveGuard::enter(Arc::clone(&shared));
        Self {
            shared,
            guard,
            driver,
            frame_interval: config.frame_interval(),
            max_delta: config.max_frame_delta(),
            max_failures: config.max_consecutive_failures,
            phase: LoopPhase::NotStarted,
            paused: false,
            lifecycle: LifecycleState::Created,
            redraw_requested: false,
            announced: None,
            last_frame: None,
            consecutive_failures: 0,
            report: LoopReport::default(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Last lifecycle state reported by the host in this run.
    #[must_use]
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Counters so far.
    #[must_use]
    pub fn report(&self) -> LoopReport {
        self.report
    }

    /// Runs until Stop or a terminal frame error, then settles and returns.
    ///
    /// # Errors
    ///
    /// [`BridgeError::LoopFailed`] when the driver fails fatally or too many
    /// times in a row.
    pub fn run(mut self) -> BridgeResult<LoopReport> {
        tracing::info!(
            interval_us = self.frame_interval.as_micros() as u64,
            "execution loop starting"
        );

        let outcome = loop {
            match self.run_iteration() {
                Ok(Iteration::Continue) => {
                    let wait = self.next_wait();
                    if !wait.is_zero() {
                        self.shared.queue().wait_for_events(wait);
                    }
                }
                Ok(Iteration::Stop) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.finish();
        outcome.map(|()| self.report)
    }

    /// Runs one iteration: drain and apply events, then maybe one frame.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_iteration(&mut self) -> BridgeResult<Iteration> {
        match self.phase {
            LoopPhase::NotStarted => self.begin(),
            LoopPhase::Stopping | LoopPhase::Terminated => return Ok(Iteration::Stop),
            _ => {}
        }
        self.report.iterations += 1;

        let (events, coalesced) = coalesce_resizes(self.shared.queue().drain_all());
        self.shared.queue().record_coalesced(coalesced);
        self.report.resizes_coalesced += coalesced as u64;

        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            if matches!(event, Event::Stop) {
                self.enter(LoopPhase::Stopping);
                let mut settled = SettleReport::default();
                for rest in events.by_ref() {
                    self.shared.settle(rest, &mut settled);
                }
                self.absorb(settled);
                return Ok(Iteration::Stop);
            }
            self.apply(event);
        }
        self.announce_surface();

        self.refresh_phase();
        self.frame()?;
        Ok(Iteration::Continue)
    }

    /// How long to sleep before the next iteration if no event arrives.
    #[must_use]
    pub fn next_wait(&self) -> Duration {
        if !self.can_present() {
            return self.frame_interval;
        }
        if self.redraw_requested {
            return Duration::ZERO;
        }
        self.last_frame.map_or(Duration::ZERO, |last| {
            self.frame_interval.saturating_sub(last.elapsed())
        })
    }

    fn begin(&mut self) {
        self.enter(LoopPhase::Initializing);
        if let Some(generation) = self.shared.surface().generation() {
            tracing::debug!(generation, "surface carried over from previous run");
        }
    }

    /// Tells the driver about the bound surface once the batch is applied,
    /// so a window destroyed within the same batch is never handed out.
    fn announce_surface(&mut self) {
        let Some(surface) = self.shared.surface().current() else {
            return;
        };
        if self.announced != Some(surface.generation()) {
            self.announced = Some(surface.generation());
            self.driver.surface_bound(&surface);
            self.redraw_requested = true;
        }
    }

    fn is_announced(&self, surface: &Surface) -> bool {
        self.announced == Some(surface.generation())
    }

    fn apply(&mut self, event: Event) {
        self.report.events_applied += 1;
        match event {
            Event::SurfaceCreated { window, size } => {
                let generation = self.shared.surface().bind(window, size);
                tracing::info!(generation, %size, "surface bound");
            }
            Event::SurfaceChanged(size) => {
                if self.shared.surface().update_size(size) {
                    tracing::debug!(%size, "surface resized");
                    let current = self.shared.surface().current();
                    if let Some(surface) = current.filter(|s| self.is_announced(s)) {
                        self.driver.surface_resized(&surface);
                    }
                    self.redraw_requested = true;
                } else {
                    tracing::debug!(%size, "resize ignored; no surface bound");
                }
            }
            Event::SurfaceDestroyed(ticket) => {
                match self.shared.surface().unbind() {
                    Some(previous) => {
                        tracing::info!(generation = previous.generation(), "surface unbound");
                        if self.is_announced(&previous) {
                            self.announced = None;
                            drop(previous);
                            self.driver.surface_lost();
                        }
                    }
                    None => tracing::debug!("destroy with no surface bound"),
                }
                ticket.mark_released();
            }
            Event::SurfaceRedrawNeeded => {
                self.redraw_requested = true;
                self.driver.input(InputEvent::RedrawNeeded);
            }
            Event::Touch(touch) => self.driver.input(InputEvent::Touch(touch)),
            Event::Resumed => self.set_lifecycle(LifecycleState::Resumed),
            Event::Paused => self.set_lifecycle(LifecycleState::Paused),
            // Intercepted by run_iteration
            Event::Stop => {}
        }
    }

    fn set_lifecycle(&mut self, next: LifecycleState) {
        match self.lifecycle.transition(next) {
            Some(state) => {
                if self.lifecycle == LifecycleState::Created && state == LifecycleState::Resumed {
                    self.driver.started();
                }
                self.lifecycle = state;
                self.driver.lifecycle(state);
            }
            None => {
                tracing::warn!(from = ?self.lifecycle, to = ?next, "out-of-order lifecycle event");
            }
        }

        // The pause flag follows the host even when the lifecycle record
        // rejects the transition
        let paused = next == LifecycleState::Paused;
        if paused != self.paused {
            self.paused = paused;
            if !paused {
                // Time spent in the background is not simulated
                self.last_frame = None;
                self.redraw_requested = true;
            }
        }
    }

    fn refresh_phase(&mut self) {
        let next = match self.phase {
            LoopPhase::Initializing if self.shared.surface().is_bound() => {
                if self.paused {
                    LoopPhase::Paused
                } else {
                    LoopPhase::Active
                }
            }
            LoopPhase::Active if self.paused => LoopPhase::Paused,
            LoopPhase::Paused if !self.paused => LoopPhase::Active,
            phase => phase,
        };
        self.enter(next);
    }

    fn enter(&mut self, next: LoopPhase) {
        if next != self.phase {
            tracing::debug!(from = self.phase.as_str(), to = next.as_str(), "loop phase");
            self.phase = next;
        }
    }

    fn can_present(&self) -> bool {
        self.phase == LoopPhase::Active
            && self
                .shared
                .surface()
                .current()
                .is_some_and(|surface| !surface.size().is_empty())
    }

    fn frame(&mut self) -> BridgeResult<()> {
        let now = Instant::now();
        let due = self.redraw_requested
            || !matches!(
                self.last_frame,
                Some(last) if now.duration_since(last) < self.frame_interval
            );
        if !due {
            return Ok(());
        }

        let surface = match self.shared.surface().current() {
            Some(surface) if self.phase == LoopPhase::Active && !surface.size().is_empty() => {
                surface
            }
            _ => {
                self.report.frames_skipped += 1;
                return Ok(());
            }
        };

        let delta = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.duration_since(last))
            .min(self.max_delta);
        self.last_frame = Some(now);
        self.redraw_requested = false;

        let result = self
            .driver
            .update(delta)
            .and_then(|()| self.driver.present(&surface));
        drop(surface);

        match result {
            Ok(()) => {
                self.report.frames_presented += 1;
                self.consecutive_failures = 0;
                Ok(())
            }
            Err(err) => self.frame_failed(&err),
        }
    }

    fn frame_failed(&mut self, err: &FrameError) -> BridgeResult<()> {
        self.report.frames_failed += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if err.is_fatal() || self.consecutive_failures >= self.max_failures {
            tracing::error!(
                error = %err,
                consecutive = self.consecutive_failures,
                "frame driver failed; stopping loop"
            );
            return Err(BridgeError::LoopFailed {
                reason: err.reason().to_string(),
                consecutive_failures: self.consecutive_failures,
            });
        }

        tracing::warn!(
            error = %err,
            consecutive = self.consecutive_failures,
            "frame failed; skipping"
        );
        Ok(())
    }

    fn absorb(&mut self, settled: SettleReport) {
        self.report.events_applied += settled.applied;
        self.report.events_discarded += settled.discarded;
    }

    fn finish(&mut self) {
        self.enter(LoopPhase::Stopping);
        self.lifecycle = LifecycleState::Destroyed;
        self.driver.lifecycle(LifecycleState::Destroyed);

        let settled = self.guard.settle();
        self.absorb(settled);
        self.enter(LoopPhase::Terminated);

        tracing::info!(
            iterations = self.report.iterations,
            presented = self.report.frames_presented,
            skipped = self.report.frames_skipped,
            failed = self.report.frames_failed,
            "execution loop terminated"
        );
    }
}
