//! # Synchronization Primitives for the UI/Loop Bridge
//!
//! ## The Problem
//!
//! ```text
//! UI thread:         surfaceDestroyed() → free native window
//! Execution thread:  ... present(window) ...
//!
//! Without ordering: PRESENT INTO FREED WINDOW → CRASH
//! ```
//!
//! ## The Solution
//!
//! Two choke points and one acknowledgement:
//!
//! ```text
//! EventQueue      UI pushes, loop drains once per iteration (FIFO, never blocks UI)
//! SurfaceHandle   loop binds/unbinds, readers see (window, generation, size) as one unit
//! SurfaceRelease  resolved once the loop can no longer present to a destroyed window
//! ```

mod completion;
mod event_queue;
mod surface_handle;

pub use completion::SurfaceRelease;
pub use event_queue::{coalesce_resizes, EventQueue, QueueStats};
pub use surface_handle::SurfaceHandle;
