//! Fixtures shared by the scenario tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use tether_core::{InputEvent, LifecycleState, NativeWindow, Surface, SurfaceSize};
use tether_runtime::{engine, BridgeConfig, FrameDriver, FrameError, LoopController};

/// Host window stand-in. Carries a label so tests can tell windows apart.
#[derive(Debug)]
pub struct HostWindow(pub &'static str);

impl HasWindowHandle for HostWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for HostWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

pub fn window(label: &'static str) -> Arc<dyn NativeWindow> {
    Arc::new(HostWindow(label))
}

/// What the driver saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Bound { generation: u64, size: SurfaceSize },
    Resized(SurfaceSize),
    Lost,
    Lifecycle(LifecycleState),
    Input(InputEvent),
    Present { generation: u64, size: SurfaceSize },
}

/// Records every driver callback into a shared log.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    log: Arc<Mutex<Vec<Seen>>>,
}

impl RecordingDriver {
    pub fn with_log(log: Arc<Mutex<Vec<Seen>>>) -> Self {
        Self { log }
    }
}

impl FrameDriver for RecordingDriver {
    fn surface_bound(&mut self, surface: &Surface) {
        self.log.lock().push(Seen::Bound {
            generation: surface.generation(),
            size: surface.size(),
        });
    }

    fn surface_resized(&mut self, surface: &Surface) {
        self.log.lock().push(Seen::Resized(surface.size()));
    }

    fn surface_lost(&mut self) {
        self.log.lock().push(Seen::Lost);
    }

    fn lifecycle(&mut self, state: LifecycleState) {
        self.log.lock().push(Seen::Lifecycle(state));
    }

    fn input(&mut self, event: InputEvent) {
        self.log.lock().push(Seen::Input(event));
    }

    fn update(&mut self, _delta: Duration) -> Result<(), FrameError> {
        Ok(())
    }

    fn present(&mut self, surface: &Surface) -> Result<(), FrameError> {
        self.log.lock().push(Seen::Present {
            generation: surface.generation(),
            size: surface.size(),
        });
        Ok(())
    }
}

/// A started-ready controller whose drivers all write to the returned log.
pub fn recording_controller(config: BridgeConfig) -> (LoopController, Arc<Mutex<Vec<Seen>>>) {
    engine::initialize(|| Ok::<(), String>(())).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let driver_log = Arc::clone(&log);
    let controller = LoopController::new(config, move || {
        Ok(Box::new(RecordingDriver::with_log(Arc::clone(&driver_log))) as Box<dyn FrameDriver>)
    })
    .unwrap();
    (controller, log)
}

pub fn presents(log: &Mutex<Vec<Seen>>) -> usize {
    log.lock()
        .iter()
        .filter(|s| matches!(s, Seen::Present { .. }))
        .count()
}

pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
