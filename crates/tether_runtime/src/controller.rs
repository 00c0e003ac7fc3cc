//! # Loop Controller
//!
//! The UI-facing object. Owns the execution thread and the shared bridge,
//! and turns host notifications into queued events.
//!
//! Control calls (`start`, `stop`) are serialized by one lock; `report_*`
//! calls never take it and never wait for the loop, except
//! [`report_surface_destroyed_and_wait`](LoopController::report_surface_destroyed_and_wait).
//!
//! ```text
//! Stopped ──start()──> Starting ──thread ready──> Running
//!    ^                    │                          │
//!    └──── init failed ───┘                       stop()
//!    │                                               v
//!    └───────────────── joined ─────────────── StopRequested
//! ```

use std::cell::Cell;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use tether_core::{
    Event, NativeWindow, QueueStats, Surface, SurfaceRelease, SurfaceSize, TouchInput, TouchPhase,
};

use crate::config::BridgeConfig;
use crate::driver::{DriverFactory, FrameDriver};
use crate::engine;
use crate::error::{BridgeError, BridgeResult, FrameError};
use crate::execution_loop::{ExecutionLoop, LoopReport};
use crate::shared::SharedBridge;

thread_local! {
    /// Identity of the bridge whose loop runs on this thread, or 0.
    static LOOP_OWNER: Cell<usize> = const { Cell::new(0) };
}

type LoopThread = JoinHandle<BridgeResult<LoopReport>>;

/// Run state of the execution thread as seen by the UI side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// No thread.
    Stopped,
    /// Thread spawned, driver being built.
    Starting,
    /// Loop running.
    Running,
    /// Stop queued, joining.
    StopRequested,
}

impl RunState {
    /// Name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::StopRequested => "stop_requested",
        }
    }
}

/// Starts, stops and feeds one execution loop.
pub struct LoopController {
    config: BridgeConfig,
    shared: Arc<SharedBridge>,
    factory: DriverFactory,
    control: Mutex<Option<LoopThread>>,
    state: Mutex<RunState>,
    last_report: Mutex<Option<LoopReport>>,
    last_error: Mutex<Option<BridgeError>>,
}

impl LoopController {
    /// Creates a stopped controller. `factory` builds a fresh driver at the
    /// start of every run, on the execution thread.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidConfig`] if `config` does not validate.
    pub fn new<F>(config: BridgeConfig, factory: F) -> BridgeResult<Self>
    where
        F: Fn() -> Result<Box<dyn FrameDriver>, FrameError> + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            shared: Arc::new(SharedBridge::new()),
            factory: Arc::new(factory),
            control: Mutex::new(None),
            state: Mutex::new(RunState::Stopped),
            last_report: Mutex::new(None),
            last_error: Mutex::new(None),
        })
    }

    /// Spawns the execution thread and returns once it is running.
    ///
    /// If a loop is already running it is stopped first, so at most one
    /// thread ever consumes the queue.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::EngineNotInitialized`] before [`engine::initialize`].
    /// - [`BridgeError::ThreadStart`] if the thread or its driver cannot be
    ///   created. The state is back to `Stopped`.
    /// - [`BridgeError::InvalidStateTransition`] when called from the
    ///   execution thread.
    pub fn start(&self) -> BridgeResult<()> {
        self.reject_on_loop_thread(RunState::Running)?;
        engine::ensure_initialized()?;

        let mut control = self.control.lock();
        if control.is_some() {
            tracing::info!("start() while running; restarting loop");
            if let Err(e) = self.stop_locked(&mut control) {
                tracing::warn!(error = %e, "previous run ended with an error; see last_error()");
            }
        }

        self.set_state(RunState::Starting);
        let (ready_tx, ready_rx) = bounded::<BridgeResult<()>>(1);
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);
        let factory = Arc::clone(&self.factory);
        let owner = self.owner_id();

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                LOOP_OWNER.with(|cell| cell.set(owner));
                let driver = match factory() {
                    Ok(driver) => driver,
                    Err(e) => {
                        let err = BridgeError::ThreadStart(e.to_string());
                        let _ = ready_tx.send(Err(err.clone()));
                        return Err(err);
                    }
                };
                let execution = ExecutionLoop::new(&config, shared, driver);
                let _ = ready_tx.send(Ok(()));
                drop(ready_tx);
                execution.run()
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn execution thread");
                self.set_state(RunState::Stopped);
                return Err(BridgeError::ThreadStart(e.to_string()));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *control = Some(handle);
                self.set_state(RunState::Running);
                tracing::info!(thread = %self.config.thread_name, "execution loop running");
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                tracing::error!(error = %err, "execution thread failed to initialize");
                self.set_state(RunState::Stopped);
                Err(err)
            }
            Err(_) => {
                // Sender dropped without a word: the thread died during init
                let err = match handle.join() {
                    Ok(Err(e)) => e,
                    Ok(Ok(_)) => {
                        BridgeError::ThreadStart("execution thread exited before ready".into())
                    }
                    Err(_) => BridgeError::LoopPanicked,
                };
                tracing::error!(error = %err, "execution thread failed to initialize");
                self.set_state(RunState::Stopped);
                Err(err)
            }
        }
    }

    /// Requests Stop and joins the thread.
    ///
    /// Returns the run's counters, or `None` if nothing was running.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// - The error that ended the loop, if it failed on its own
    ///   ([`BridgeError::LoopFailed`] or [`BridgeError::LoopPanicked`]).
    /// - [`BridgeError::InvalidStateTransition`] when called from the
    ///   execution thread, which cannot join itself.
    pub fn stop(&self) -> BridgeResult<Option<LoopReport>> {
        self.reject_on_loop_thread(RunState::Stopped)?;
        let mut control = self.control.lock();
        self.stop_locked(&mut control)
    }

    fn stop_locked(&self, slot: &mut Option<LoopThread>) -> BridgeResult<Option<LoopReport>> {
        let Some(handle) = slot.take() else {
            tracing::debug!("stop() with no loop running");
            return Ok(None);
        };

        self.set_state(RunState::StopRequested);
        self.shared.queue().push(Event::Stop);
        let joined = handle.join();
        // A loop that ended on its own never consumed this Stop
        self.shared.queue().purge(|event| matches!(event, Event::Stop));
        self.set_state(RunState::Stopped);

        let outcome = match joined {
            Ok(Ok(report)) => {
                tracing::info!(
                    presented = report.frames_presented,
                    skipped = report.frames_skipped,
                    failed = report.frames_failed,
                    "execution loop joined"
                );
                *self.last_report.lock() = Some(report);
                Ok(Some(report))
            }
            Ok(Err(err)) => {
                tracing::error!(error = %err, "execution loop ended with an error");
                Err(err)
            }
            Err(_) => {
                tracing::error!("execution thread panicked");
                Err(BridgeError::LoopPanicked)
            }
        };
        if let Err(err) = &outcome {
            *self.last_error.lock() = Some(err.clone());
        }
        outcome
    }

    fn reject_on_loop_thread(&self, requested: RunState) -> BridgeResult<()> {
        if self.on_loop_thread() {
            let from = self.run_state();
            tracing::error!(
                from = from.as_str(),
                requested = requested.as_str(),
                "control call from the execution thread"
            );
            return Err(BridgeError::InvalidStateTransition { from, requested });
        }
        Ok(())
    }

    fn on_loop_thread(&self) -> bool {
        LOOP_OWNER.with(Cell::get) == self.owner_id()
    }

    fn owner_id(&self) -> usize {
        Arc::as_ptr(&self.shared) as usize
    }

    fn set_state(&self, next: RunState) {
        let mut state = self.state.lock();
        if *state != next {
            tracing::debug!(from = state.as_str(), to = next.as_str(), "run state");
            *state = next;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current run state.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        *self.state.lock()
    }

    /// True while a loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_state() == RunState::Running
    }

    /// True if the loop thread exited on its own and is waiting to be
    /// joined by `stop()`.
    #[must_use]
    pub fn has_terminated(&self) -> bool {
        self.control
            .lock()
            .as_ref()
            .is_some_and(JoinHandle::is_finished)
    }

    /// Counters from the last run that stopped cleanly.
    #[must_use]
    pub fn last_report(&self) -> Option<LoopReport> {
        *self.last_report.lock()
    }

    /// The error that ended the last run that failed on its own. Kept across
    /// restarts, so a failure swallowed by `start()` is still visible here.
    #[must_use]
    pub fn last_error(&self) -> Option<BridgeError> {
        self.last_error.lock().clone()
    }

    /// Snapshot of the bound surface.
    #[must_use]
    pub fn surface(&self) -> Option<Surface> {
        self.shared.surface().current()
    }

    /// Queue counters.
    #[must_use]
    pub fn queue_stats(&self) -> QueueStats {
        self.shared.queue().stats()
    }

    /// The configuration this controller runs with.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The shared queue and surface slot.
    #[must_use]
    pub fn shared(&self) -> &Arc<SharedBridge> {
        &self.shared
    }

    // =========================================================================
    // Host notifications (UI thread)
    // =========================================================================

    /// The host created a drawable window.
    pub fn report_surface_created(&self, window: Arc<dyn NativeWindow>, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        tracing::debug!(%size, "host: surface created");
        self.shared.queue().push(Event::SurfaceCreated { window, size });
    }

    /// The host window changed size.
    pub fn report_surface_changed(&self, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        tracing::trace!(%size, "host: surface changed");
        self.shared.queue().push(Event::SurfaceChanged(size));
    }

    /// The host window is going away. Free it only once the returned ticket
    /// is released.
    pub fn report_surface_destroyed(&self) -> SurfaceRelease {
        tracing::debug!("host: surface destroyed");
        self.shared.push_surface_destroyed()
    }

    /// Like [`report_surface_destroyed`](Self::report_surface_destroyed),
    /// but blocks until the loop has let go of the window.
    pub fn report_surface_destroyed_and_wait(&self) {
        let ticket = self.report_surface_destroyed();
        if self.on_loop_thread() {
            tracing::warn!("surface destroyed from the execution thread; not waiting");
            return;
        }
        ticket.wait();
    }

    /// The host asked for a fresh frame.
    pub fn report_redraw_needed(&self) {
        self.shared.queue().push(Event::SurfaceRedrawNeeded);
    }

    /// One touch sample.
    pub fn report_touch(&self, pointer_id: i32, phase: TouchPhase, x: f32, y: f32) {
        self.shared.queue().push(Event::Touch(TouchInput {
            pointer_id,
            phase,
            x,
            y,
        }));
    }

    /// Host activity moved to the foreground.
    pub fn report_resumed(&self) {
        tracing::debug!("host: resumed");
        self.shared.queue().push(Event::Resumed);
    }

    /// Host activity moved to the background.
    pub fn report_paused(&self) {
        tracing::debug!("host: paused");
        self.shared.queue().push(Event::Paused);
    }
}

impl Drop for LoopController {
    fn drop(&mut self) {
        if self.on_loop_thread() {
            // The thread cannot join itself: queue Stop and let it exit after
            // the current frame
            if self.control.get_mut().take().is_some() {
                tracing::warn!("controller dropped on the execution thread; loop detached");
                self.shared.queue().push(Event::Stop);
            }
            self.set_state(RunState::Stopped);
            return;
        }
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "execution loop did not stop cleanly on drop");
        }
    }
}

impl std::fmt::Debug for LoopController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopController")
            .field("state", &self.run_state())
            .field("config", &self.config)
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}
