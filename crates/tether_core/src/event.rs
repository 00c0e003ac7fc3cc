//! # Bridge Events
//!
//! Everything the UI side can tell the execution loop.
//!
//! ## Event Flow
//!
//! ```text
//! surfaceCreated   ──► SurfaceCreated   ──┐
//! surfaceChanged   ──► SurfaceChanged   ──┤
//! surfaceDestroyed ──► SurfaceDestroyed ──┤
//! redrawNeeded     ──► RedrawNeeded     ──┼──► EventQueue ──► ExecutionLoop
//! onTouch          ──► Touch            ──┤
//! onResume/onPause ──► Resumed/Paused   ──┤
//! stop()           ──► Stop             ──┘
//! ```
//!
//! Events are not `Clone`: each one is delivered to the loop exactly once.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::surface::{NativeWindow, SurfaceSize};
use crate::sync::SurfaceRelease;

/// A notification crossing from the UI thread to the execution thread.
#[derive(Debug)]
pub enum Event {
    /// The host created a drawable target.
    SurfaceCreated {
        /// The host window.
        window: Arc<dyn NativeWindow>,
        /// Its size at creation.
        size: SurfaceSize,
    },
    /// The current target changed size.
    SurfaceChanged(SurfaceSize),
    /// The current target is going away. The ticket is resolved once the loop
    /// can no longer present to it.
    SurfaceDestroyed(SurfaceRelease),
    /// The host asked for a fresh frame.
    SurfaceRedrawNeeded,
    /// Pointer input on the surface.
    Touch(TouchInput),
    /// Host activity resumed.
    Resumed,
    /// Host activity paused.
    Paused,
    /// Stop the loop after the current frame.
    Stop,
}

impl Event {
    /// Returns the payload-free kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::SurfaceCreated { .. } => EventKind::SurfaceCreated,
            Self::SurfaceChanged(_) => EventKind::SurfaceChanged,
            Self::SurfaceDestroyed(_) => EventKind::SurfaceDestroyed,
            Self::SurfaceRedrawNeeded => EventKind::SurfaceRedrawNeeded,
            Self::Touch(_) => EventKind::Touch,
            Self::Resumed => EventKind::Resumed,
            Self::Paused => EventKind::Paused,
            Self::Stop => EventKind::Stop,
        }
    }

    /// True for events that change which surface is bound (a resize run
    /// never coalesces across one of these).
    #[must_use]
    pub const fn is_surface_boundary(&self) -> bool {
        matches!(
            self,
            Self::SurfaceCreated { .. } | Self::SurfaceDestroyed(_) | Self::Stop
        )
    }
}

/// Payload-free event discriminant, for logging and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// See [`Event::SurfaceCreated`].
    SurfaceCreated = 0,
    /// See [`Event::SurfaceChanged`].
    SurfaceChanged = 1,
    /// See [`Event::SurfaceDestroyed`].
    SurfaceDestroyed = 2,
    /// See [`Event::SurfaceRedrawNeeded`].
    SurfaceRedrawNeeded = 3,
    /// See [`Event::Touch`].
    Touch = 4,
    /// See [`Event::Resumed`].
    Resumed = 5,
    /// See [`Event::Paused`].
    Paused = 6,
    /// See [`Event::Stop`].
    Stop = 7,
}

impl EventKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SurfaceCreated => "surface_created",
            Self::SurfaceChanged => "surface_changed",
            Self::SurfaceDestroyed => "surface_destroyed",
            Self::SurfaceRedrawNeeded => "surface_redraw_needed",
            Self::Touch => "touch",
            Self::Resumed => "resumed",
            Self::Paused => "paused",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of a touch pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// Pointer went down.
    Started,
    /// Pointer moved while down.
    Moved,
    /// Pointer lifted.
    Ended,
    /// Gesture was cancelled by the host.
    Cancelled,
}

/// A host action code that does not map to a [`TouchPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown touch action code: {0}")]
pub struct UnknownTouchAction(pub i32);

impl TryFrom<i32> for TouchPhase {
    type Error = UnknownTouchAction;

    /// Decodes masked host action codes (down, up, move, cancel,
    /// pointer-down, pointer-up).
    fn try_from(action: i32) -> Result<Self, Self::Error> {
        match action {
            0 | 5 => Ok(Self::Started),
            1 | 6 => Ok(Self::Ended),
            2 => Ok(Self::Moved),
            3 => Ok(Self::Cancelled),
            other => Err(UnknownTouchAction(other)),
        }
    }
}

/// One touch sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInput {
    /// Host pointer id, stable for the life of a gesture.
    pub pointer_id: i32,
    /// Phase.
    pub phase: TouchPhase,
    /// X in surface pixels.
    pub x: f32,
    /// Y in surface pixels.
    pub y: f32,
}

/// Input forwarded from the loop to the frame driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A touch sample.
    Touch(TouchInput),
    /// The host asked for a redraw.
    RedrawNeeded,
}

/// Host activity lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Created, not yet visible.
    Created,
    /// In the foreground.
    Resumed,
    /// In the background.
    Paused,
    /// Gone for good.
    Destroyed,
}

impl LifecycleState {
    /// Validates a transition. Returns the new state, or `None` if the host
    /// reported something out of order.
    ///
    /// Re-reporting the current state is accepted as a no-op.
    #[must_use]
    pub fn transition(self, next: Self) -> Option<Self> {
        use LifecycleState::{Created, Destroyed, Paused, Resumed};
        match (self, next) {
            (Destroyed, _) => None,
            (_, Destroyed)
            | (Created | Paused, Resumed)
            | (Resumed, Paused) => Some(next),
            (a, b) if a == b => Some(b),
            _ => None,
        }
    }

    /// True while the host is in the foreground.
    #[inline]
    #[must_use]
    pub const fn is_resumed(self) -> bool {
        matches!(self, Self::Resumed)
    }
}
