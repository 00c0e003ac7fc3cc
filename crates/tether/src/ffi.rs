//! # C ABI
//!
//! Plain C entry points for host glue (JNI shims, Objective-C). One
//! process-wide controller backs all of them.
//!
//! Call order from the host:
//!
//! 1. Rust side: [`install_driver_factory`]
//! 2. `tether_initialize(config_toml)` once per process
//! 3. `tether_start()` / `tether_stop()` with the activity lifecycle
//! 4. `tether_surface_*`, `tether_touch_event`, `tether_on_*` from the UI
//!    thread at any time
//!
//! Status codes: `0` on success, otherwise [`BridgeError::code`].

#![allow(unsafe_code)]

use std::ffi::{c_char, c_void, CStr};
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

use parking_lot::{const_mutex, Mutex};
use raw_window_handle::{
    AndroidDisplayHandle, AndroidNdkWindowHandle, DisplayHandle, HandleError, HasDisplayHandle,
    HasWindowHandle, RawDisplayHandle, RawWindowHandle, WindowHandle,
};
use tether_core::{SurfaceSize, TouchPhase};
use tether_runtime::{
    engine, BridgeConfig, BridgeError, BridgeResult, DriverFactory, FrameDriver, FrameError,
    LoopController,
};

static FACTORY: Mutex<Option<DriverFactory>> = const_mutex(None);
static CONTROLLER: OnceLock<LoopController> = OnceLock::new();

/// Status code for success.
pub const TETHER_OK: i32 = 0;

/// Registers how each run builds its frame driver. Must be called before
/// `tether_initialize`. A later call replaces the factory for later runs.
pub fn install_driver_factory<F>(factory: F)
where
    F: Fn() -> Result<Box<dyn FrameDriver>, FrameError> + Send + Sync + 'static,
{
    *FACTORY.lock() = Some(Arc::new(factory));
    tracing::debug!("driver factory installed");
}

fn installed_driver() -> Result<Box<dyn FrameDriver>, FrameError> {
    let factory = FACTORY.lock().clone();
    match factory {
        Some(factory) => factory(),
        None => Err(FrameError::Fatal("no driver factory installed".into())),
    }
}

fn status(result: BridgeResult<()>) -> i32 {
    match result {
        Ok(()) => TETHER_OK,
        Err(e) => {
            tracing::error!(error = %e, code = e.code(), "c api call failed");
            e.code()
        }
    }
}

fn controller() -> Option<&'static LoopController> {
    let controller = CONTROLLER.get();
    if controller.is_none() {
        tracing::warn!("c api call before tether_initialize");
    }
    controller
}

// =============================================================================
// Host window
// =============================================================================

/// An `ANativeWindow*` handed over by the host.
///
/// The host keeps the window alive until `tether_surface_destroyed` returns,
/// which is after the loop has stopped presenting to it.
#[derive(Debug)]
pub struct AndroidWindow {
    ptr: NonNull<c_void>,
}

// SAFETY: the pointer is an opaque token here. It is only handed to the
// driver through raw-window-handle, and the host keeps the window alive until
// the release ticket for it resolves.
unsafe impl Send for AndroidWindow {}
// SAFETY: as above; this type never dereferences the pointer.
unsafe impl Sync for AndroidWindow {}

impl AndroidWindow {
    /// Wraps a host window pointer. Returns `None` for null.
    #[must_use]
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }
}

impl HasWindowHandle for AndroidWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        let raw = RawWindowHandle::AndroidNdk(AndroidNdkWindowHandle::new(self.ptr));
        // SAFETY: the host keeps the window valid for the lifetime of self.
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}

impl HasDisplayHandle for AndroidWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        let raw = RawDisplayHandle::Android(AndroidDisplayHandle::new());
        // SAFETY: the Android display handle carries no data.
        Ok(unsafe { DisplayHandle::borrow_raw(raw) })
    }
}

// =============================================================================
// Control
// =============================================================================

/// Initializes the engine and the process-wide controller.
///
/// `config_toml` may be null for defaults. Calling again is a no-op that
/// returns `0`; the first configuration stays in effect.
///
/// # Safety
///
/// `config_toml` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn tether_initialize(config_toml: *const c_char) -> i32 {
    let config = if config_toml.is_null() {
        Ok(BridgeConfig::default())
    } else {
        // SAFETY: guaranteed by the caller.
        let text = unsafe { CStr::from_ptr(config_toml) };
        text.to_str()
            .map_err(|e| BridgeError::InvalidConfig(e.to_string()))
            .and_then(BridgeConfig::from_toml_str)
    };

    status(config.and_then(initialize_with))
}

fn initialize_with(config: BridgeConfig) -> BridgeResult<()> {
    engine::initialize(|| {
        if FACTORY.lock().is_some() {
            Ok(())
        } else {
            Err("install_driver_factory must be called first")
        }
    })?;

    if CONTROLLER.get().is_some() {
        tracing::debug!("controller already created; ignoring new configuration");
        return Ok(());
    }
    let controller = LoopController::new(config, installed_driver)?;
    if CONTROLLER.set(controller).is_err() {
        tracing::debug!("controller created concurrently; keeping the first one");
    }
    Ok(())
}

/// Starts the execution loop. Restarts it if already running.
#[no_mangle]
pub extern "C" fn tether_start() -> i32 {
    match controller() {
        Some(controller) => status(controller.start()),
        None => BridgeError::EngineNotInitialized.code(),
    }
}

/// Stops and joins the execution loop. Returns the loop's error if it had
/// failed on its own.
#[no_mangle]
pub extern "C" fn tether_stop() -> i32 {
    match controller() {
        Some(controller) => status(controller.stop().map(drop)),
        None => TETHER_OK,
    }
}

// =============================================================================
// Host notifications
// =============================================================================

/// The host created a window. Null pointers are ignored.
#[no_mangle]
pub extern "C" fn tether_surface_created(window: *mut c_void, width: i32, height: i32) {
    let Some(controller) = controller() else {
        return;
    };
    let Some(window) = AndroidWindow::new(window) else {
        tracing::warn!("surface created with a null window; ignored");
        return;
    };
    let size = SurfaceSize::from_host(width, height);
    controller.report_surface_created(Arc::new(window), size.width, size.height);
}

/// The window changed size.
#[no_mangle]
pub extern "C" fn tether_surface_changed(width: i32, height: i32) {
    if let Some(controller) = controller() {
        let size = SurfaceSize::from_host(width, height);
        controller.report_surface_changed(size.width, size.height);
    }
}

/// The window is going away. Returns once the loop no longer presents to it;
/// the host may free it afterwards.
#[no_mangle]
pub extern "C" fn tether_surface_destroyed() {
    if let Some(controller) = controller() {
        controller.report_surface_destroyed_and_wait();
    }
}

/// The host asked for a redraw.
#[no_mangle]
pub extern "C" fn tether_surface_redraw_needed() {
    if let Some(controller) = controller() {
        controller.report_redraw_needed();
    }
}

/// One touch sample with a host action code (down/up/move/cancel, plus
/// pointer down/up). Unknown actions are dropped.
#[no_mangle]
pub extern "C" fn tether_touch_event(pointer_id: i32, action: i32, x: f32, y: f32) {
    let Some(controller) = controller() else {
        return;
    };
    match TouchPhase::try_from(action) {
        Ok(phase) => controller.report_touch(pointer_id, phase, x, y),
        Err(e) => tracing::debug!(error = %e, "touch dropped"),
    }
}

/// The host activity resumed.
#[no_mangle]
pub extern "C" fn tether_on_resume() {
    if let Some(controller) = controller() {
        controller.report_resumed();
    }
}

/// The host activity paused.
#[no_mangle]
pub extern "C" fn tether_on_pause() {
    if let Some(controller) = controller() {
        controller.report_paused();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};
    use tether_runtime::FnDriver;

    static PRESENTS: AtomicUsize = AtomicUsize::new(0);

    fn wait_for_presents(target: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if PRESENTS.load(Ordering::SeqCst) >= target {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_android_window_handle() {
        let mut backing = 0u8;
        let ptr = std::ptr::addr_of_mut!(backing).cast::<c_void>();
        let window = AndroidWindow::new(ptr).unwrap();

        let handle = window.window_handle().unwrap();
        match handle.as_raw() {
            RawWindowHandle::AndroidNdk(h) => assert_eq!(h.a_native_window.as_ptr(), ptr),
            other => panic!("unexpected handle {other:?}"),
        }
        assert!(matches!(
            window.display_handle().unwrap().as_raw(),
            RawDisplayHandle::Android(_)
        ));
        assert!(AndroidWindow::new(std::ptr::null_mut()).is_none());
    }

    // The controller is process-wide, so the whole C session is one test.
    #[test]
    fn test_c_session() {
        assert_eq!(tether_start(), BridgeError::EngineNotInitialized.code());
        assert_eq!(tether_stop(), TETHER_OK);

        let bad = CString::new("target_fps = 0").unwrap();
        assert_eq!(
            unsafe { tether_initialize(bad.as_ptr()) },
            BridgeError::InvalidConfig(String::new()).code()
        );

        install_driver_factory(|| {
            let driver = FnDriver::new(
                |_| Ok(()),
                |_| {
                    PRESENTS.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            );
            Ok(Box::new(driver) as Box<dyn FrameDriver>)
        });
        let config = CString::new("target_fps = 120").unwrap();
        assert_eq!(unsafe { tether_initialize(config.as_ptr()) }, TETHER_OK);
        assert_eq!(unsafe { tether_initialize(std::ptr::null()) }, TETHER_OK);
        assert_eq!(CONTROLLER.get().map(|c| c.config().target_fps), Some(120));

        assert_eq!(tether_start(), TETHER_OK);

        let mut backing = 0u8;
        tether_surface_created(std::ptr::null_mut(), 10, 10);
        tether_surface_created(std::ptr::addr_of_mut!(backing).cast(), 640, 480);
        tether_on_resume();
        assert!(wait_for_presents(1));

        tether_touch_event(0, 0, 1.0, 1.0);
        tether_touch_event(0, 42, 1.0, 1.0);
        tether_surface_changed(320, -5);
        tether_surface_redraw_needed();
        tether_on_pause();
        tether_on_resume();

        tether_surface_destroyed();
        let controller = CONTROLLER.get().unwrap();
        assert!(controller.surface().is_none());

        assert_eq!(tether_stop(), TETHER_OK);
        assert_eq!(tether_stop(), TETHER_OK);
        assert!(!controller.is_running());
    }
}
