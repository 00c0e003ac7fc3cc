//! Headless host: plays a scripted mobile session against the bridge.
//!
//! ```text
//! cargo run -p tether --bin headless_host [config.toml]
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use tether::{
    engine, BridgeConfig, FrameDriver, FrameError, InputEvent, LifecycleState, LoopController,
    Surface, TouchPhase,
};

/// A host with no real window system behind it.
#[derive(Debug)]
struct HeadlessWindow;

impl HasWindowHandle for HeadlessWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::NotSupported)
    }
}

impl HasDisplayHandle for HeadlessWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::NotSupported)
    }
}

/// Spins a square around the surface center and logs now and then.
#[derive(Default)]
struct SpinningSquare {
    angle: f32,
    frames: u64,
    touches: u64,
}

impl FrameDriver for SpinningSquare {
    fn surface_bound(&mut self, surface: &Surface) {
        tracing::info!(generation = surface.generation(), size = %surface.size(), "drawing to new surface");
    }

    fn surface_lost(&mut self) {
        tracing::info!(frames = self.frames, "surface lost");
    }

    fn lifecycle(&mut self, state: LifecycleState) {
        tracing::info!(?state, "lifecycle");
    }

    fn input(&mut self, event: InputEvent) {
        if let InputEvent::Touch(_) = event {
            self.touches += 1;
        }
    }

    fn update(&mut self, delta: Duration) -> Result<(), FrameError> {
        self.angle = (self.angle + delta.as_secs_f32() * 90.0) % 360.0;
        Ok(())
    }

    fn present(&mut self, surface: &Surface) -> Result<(), FrameError> {
        self.frames += 1;
        if self.frames % 30 == 0 {
            tracing::info!(
                frames = self.frames,
                angle = self.angle,
                touches = self.touches,
                size = %surface.size(),
                "present"
            );
        }
        Ok(())
    }
}

fn load_config() -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(BridgeConfig::from_toml_str(&std::fs::read_to_string(path)?)?),
        None => Ok(BridgeConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_thread_names(true)
        .init();

    let config = load_config()?;
    engine::initialize(|| Ok::<(), String>(()))?;
    let controller = LoopController::new(config, || {
        Ok(Box::new(SpinningSquare::default()) as Box<dyn FrameDriver>)
    })?;

    controller.start()?;
    controller.report_surface_created(Arc::new(HeadlessWindow), 1080, 1920);
    controller.report_resumed();
    thread::sleep(Duration::from_millis(500));

    // Rotation: a burst of size changes while the window animates
    for step in 0..20u32 {
        controller.report_surface_changed(1080 + step * 42, 1920 - step * 42);
        controller.report_touch(0, TouchPhase::Moved, step as f32 * 10.0, 500.0);
    }
    thread::sleep(Duration::from_millis(300));

    controller.report_paused();
    controller.report_touch(0, TouchPhase::Ended, 200.0, 500.0);
    thread::sleep(Duration::from_millis(200));
    controller.report_resumed();

    controller.report_surface_destroyed_and_wait();
    tracing::info!("host freed the first window");
    controller.report_surface_created(Arc::new(HeadlessWindow), 1920, 1080);
    thread::sleep(Duration::from_millis(300));

    if let Some(report) = controller.stop()? {
        println!("\n=== Headless Session ===");
        println!("Iterations:        {}", report.iterations);
        println!("Frames presented:  {}", report.frames_presented);
        println!("Frames skipped:    {}", report.frames_skipped);
        println!("Frames failed:     {}", report.frames_failed);
        println!("Events applied:    {}", report.events_applied);
        println!("Events discarded:  {}", report.events_discarded);
        println!("Resizes coalesced: {}", report.resizes_coalesced);
    }
    println!("Queue: {:?}", controller.queue_stats());
    Ok(())
}
