//! Recording driver and window stand-in for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use tether_core::{InputEvent, LifecycleState, NativeWindow, Surface, SurfaceSize};

use crate::driver::FrameDriver;
use crate::error::FrameError;

#[derive(Debug)]
pub struct FakeWindow;

impl HasWindowHandle for FakeWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for FakeWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

pub fn fake_window() -> Arc<dyn NativeWindow> {
    Arc::new(FakeWindow)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bound(u64, SurfaceSize),
    Resized(SurfaceSize),
    Lost,
    Started,
    Lifecycle(LifecycleState),
    Input(InputEvent),
    Update(Duration),
    Present(u64, SurfaceSize),
}

/// Shared log of driver calls, plus failures to inject into `present`.
#[derive(Debug, Default)]
pub struct Recording {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<FrameError>>,
}

impl Recording {
    pub fn driver(self: &Arc<Self>) -> Box<dyn FrameDriver> {
        Box::new(RecordingDriver(Arc::clone(self)))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn presents(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Present(..)))
            .count()
    }

    pub fn last_present(&self) -> Option<Call> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|c| matches!(c, Call::Present(..)))
            .cloned()
    }

    pub fn fail_next(&self, err: FrameError) {
        self.failures.lock().push_back(err);
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

struct RecordingDriver(Arc<Recording>);

impl FrameDriver for RecordingDriver {
    fn surface_bound(&mut self, surface: &Surface) {
        self.0.record(Call::Bound(surface.generation(), surface.size()));
    }

    fn surface_resized(&mut self, surface: &Surface) {
        self.0.record(Call::Resized(surface.size()));
    }

    fn surface_lost(&mut self) {
        self.0.record(Call::Lost);
    }

    fn started(&mut self) {
        self.0.record(Call::Started);
    }

    fn lifecycle(&mut self, state: LifecycleState) {
        self.0.record(Call::Lifecycle(state));
    }

    fn input(&mut self, event: InputEvent) {
        self.0.record(Call::Input(event));
    }

    fn update(&mut self, delta: Duration) -> Result<(), FrameError> {
        self.0.record(Call::Update(delta));
        Ok(())
    }

    fn present(&mut self, surface: &Surface) -> Result<(), FrameError> {
        if let Some(err) = self.0.failures.lock().pop_front() {
            return Err(err);
        }
        self.0.record(Call::Present(surface.generation(), surface.size()));
        Ok(())
    }
}
