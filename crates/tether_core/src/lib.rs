//! # Tether Core
//!
//! The two choke points between a host UI thread and a native execution loop:
//!
//! - [`EventQueue`]: every lifecycle, surface and input notification the UI
//!   side produces, in order, consumed exactly once by the loop.
//! - [`SurfaceHandle`]: the one shared view of the current drawable target.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   push()    ┌──────────────┐  drain_all()  ┌──────────────┐
//! │  UI thread   │────────────>│  EventQueue  │──────────────>│  Execution   │
//! │ (host shell) │             └──────────────┘               │    loop      │
//! │              │                                            │              │
//! │              │<── SurfaceRelease ───────────────────────── │ bind/unbind  │
//! └──────────────┘                                            └──────┬───────┘
//!                                                                    │
//!                                                             ┌──────▼───────┐
//!                                                             │SurfaceHandle │
//!                                                             └──────────────┘
//! ```
//!
//! Nothing else is shared. No thread is spawned by this crate.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod event;
pub mod surface;
pub mod sync;

pub use event::{
    Event, EventKind, InputEvent, LifecycleState, TouchInput, TouchPhase, UnknownTouchAction,
};
pub use surface::{NativeWindow, Surface, SurfaceSize};
pub use sync::{coalesce_resizes, EventQueue, QueueStats, SurfaceHandle, SurfaceRelease};
