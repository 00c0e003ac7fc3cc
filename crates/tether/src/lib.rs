//! # Tether
//!
//! Keeps a host UI thread and a native execution loop in step: surface
//! creation, resize and destruction, lifecycle, and touch input flow from the
//! UI side through one ordered queue; frames are paced and presented on a
//! dedicated thread that `stop()` always joins.
//!
//! ```text
//! host UI ──report_*──> EventQueue ──> ExecutionLoop ──> FrameDriver
//!    │                                     │
//!    └── start()/stop() ── LoopController ─┘ (spawn / join)
//! ```
//!
//! Rust hosts use [`LoopController`] directly; C hosts go through [`ffi`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ffi;

pub use tether_core::{
    Event, EventKind, EventQueue, InputEvent, LifecycleState, NativeWindow, QueueStats, Surface,
    SurfaceHandle, SurfaceRelease, SurfaceSize, TouchInput, TouchPhase,
};
pub use tether_runtime::{
    engine, BridgeConfig, BridgeError, BridgeResult, FnDriver, FrameDriver, FrameError,
    LoopController, LoopPhase, LoopReport, RunState,
};
