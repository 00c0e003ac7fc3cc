//! # Bridge Error Types
//!
//! All errors that can cross the bridge back to the host.

use thiserror::Error;

use crate::controller::RunState;

/// Errors surfaced to the host by the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// `start()` was called before the process-wide engine initialization.
    #[error("engine not initialized; call engine::initialize first")]
    EngineNotInitialized,

    /// The process-wide engine initializer failed.
    #[error("engine initialization failed: {0}")]
    EngineInit(String),

    /// The execution thread could not be brought up.
    #[error("execution thread failed to start: {0}")]
    ThreadStart(String),

    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A control call that cannot be honoured from where it was made.
    #[error("invalid state transition: {from:?} -> {requested:?}")]
    InvalidStateTransition {
        /// State at the time of the call.
        from: RunState,
        /// State the call asked for.
        requested: RunState,
    },

    /// The loop gave up and terminated.
    #[error("execution loop failed after {consecutive_failures} consecutive frame errors: {reason}")]
    LoopFailed {
        /// Last error reported by the frame driver.
        reason: String,
        /// Failed frames in a row when the loop gave up.
        consecutive_failures: u32,
    },

    /// The execution thread panicked.
    #[error("execution thread panicked")]
    LoopPanicked,
}

impl BridgeError {
    /// Stable negative status code for the C ABI.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::EngineNotInitialized => -1,
            Self::EngineInit(_) => -2,
            Self::ThreadStart(_) => -3,
            Self::InvalidConfig(_) => -4,
            Self::InvalidStateTransition { .. } => -5,
            Self::LoopFailed { .. } => -6,
            Self::LoopPanicked => -7,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error reported by a frame driver for a single frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// This frame failed; the next one may succeed (lost swapchain, timeout).
    #[error("transient frame error: {0}")]
    Transient(String),

    /// The driver cannot continue (device lost for good, corrupted state).
    #[error("fatal frame error: {0}")]
    Fatal(String),
}

impl FrameError {
    /// Returns true for errors that must stop the loop immediately.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// The message without the severity prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Transient(reason) | Self::Fatal(reason) => reason,
        }
    }
}
