//! # Frame Driver
//!
//! The seam between the loop and the opaque simulation/render engine. The
//! loop owns scheduling and surface bookkeeping; the driver only reacts.
//!
//! Every method runs on the execution thread, never concurrently.

use std::sync::Arc;
use std::time::Duration;

use tether_core::{InputEvent, LifecycleState, Surface};

use crate::error::FrameError;

/// Callbacks the execution loop makes into the engine.
///
/// Only [`update`](Self::update) and [`present`](Self::present) are required.
pub trait FrameDriver: Send {
    /// A surface became current (new generation, or carried over from a
    /// previous run).
    fn surface_bound(&mut self, _surface: &Surface) {}

    /// The current surface changed size.
    fn surface_resized(&mut self, _surface: &Surface) {}

    /// The current surface is gone. Drop anything that refers to it.
    fn surface_lost(&mut self) {}

    /// The host resumed for the first time in this run: a cold start rather
    /// than a return from the background. Called just before
    /// `lifecycle(Resumed)`.
    fn started(&mut self) {}

    /// Host lifecycle changed.
    fn lifecycle(&mut self, _state: LifecycleState) {}

    /// Input in arrival order. Delivered while paused as well.
    fn input(&mut self, _event: InputEvent) {}

    /// Advances the simulation by `delta` (already clamped).
    ///
    /// # Errors
    ///
    /// A [`FrameError`] skips presentation of this frame.
    fn update(&mut self, delta: Duration) -> Result<(), FrameError>;

    /// Renders and presents one frame to `surface`.
    ///
    /// # Errors
    ///
    /// A [`FrameError`] marks the frame as failed.
    fn present(&mut self, surface: &Surface) -> Result<(), FrameError>;
}

/// Builds a fresh driver for every run, on the execution thread.
pub type DriverFactory =
    Arc<dyn Fn() -> Result<Box<dyn FrameDriver>, FrameError> + Send + Sync + 'static>;

/// A driver made of two closures, for hosts with nothing to track.
pub struct FnDriver<U, P> {
    update: U,
    present: P,
}

impl<U, P> FnDriver<U, P>
where
    U: FnMut(Duration) -> Result<(), FrameError> + Send,
    P: FnMut(&Surface) -> Result<(), FrameError> + Send,
{
    /// Wraps `update` and `present`.
    pub fn new(update: U, present: P) -> Self {
        Self { update, present }
    }
}

impl<U, P> FrameDriver for FnDriver<U, P>
where
    U: FnMut(Duration) -> Result<(), FrameError> + Send,
    P: FnMut(&Surface) -> Result<(), FrameError> + Send,
{
    fn update(&mut self, delta: Duration) -> Result<(), FrameError> {
        (self.update)(delta)
    }

    fn present(&mut self, surface: &Surface) -> Result<(), FrameError> {
        (self.present)(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_driver_calls_closures() {
        let mut total = Duration::ZERO;
        let mut driver = FnDriver::new(
            |delta| {
                total += delta;
                Ok(())
            },
            |_surface| Err(FrameError::Transient("no swapchain".into())),
        );

        assert!(driver.update(Duration::from_millis(16)).is_ok());
        assert!(driver.update(Duration::from_millis(16)).is_ok());
        driver.input(InputEvent::RedrawNeeded);
        driver.surface_lost();
        drop(driver);

        assert_eq!(total, Duration::from_millis(32));
    }
}
