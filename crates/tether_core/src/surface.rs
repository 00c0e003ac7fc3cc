//! Surface model.
//!
//! A [`Surface`] is a bound drawable target as the execution loop sees it:
//! the host's native window, the generation it was bound under, and its
//! current size. The three always travel together so a reader can never see
//! a new window paired with a stale size.

use std::fmt;
use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// A host-owned native window the loop can present into.
///
/// Anything that can hand out raw window and display handles qualifies, so a
/// renderer (wgpu, glutin, a software blitter) can create its own swapchain
/// from it without this crate knowing which one.
pub trait NativeWindow: HasWindowHandle + HasDisplayHandle + Send + Sync + fmt::Debug {}

impl<T> NativeWindow for T where
    T: HasWindowHandle + HasDisplayHandle + Send + Sync + fmt::Debug + ?Sized
{
}

/// Pixel dimensions of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Converts host-reported signed dimensions, clamping negatives to zero.
    #[must_use]
    pub fn from_host(width: i32, height: i32) -> Self {
        Self {
            width: u32::try_from(width).unwrap_or(0),
            height: u32::try_from(height).unwrap_or(0),
        }
    }

    /// Returns true if either dimension is zero (nothing visible to draw).
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The currently bound drawable target.
///
/// Cheap to clone: the window is reference counted.
#[derive(Clone)]
pub struct Surface {
    window: Arc<dyn NativeWindow>,
    generation: u64,
    size: SurfaceSize,
}

impl Surface {
    pub(crate) fn new(window: Arc<dyn NativeWindow>, generation: u64, size: SurfaceSize) -> Self {
        Self {
            window,
            generation,
            size,
        }
    }

    pub(crate) fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    /// The host window to present into.
    #[must_use]
    pub fn window(&self) -> &Arc<dyn NativeWindow> {
        &self.window
    }

    /// Generation this surface was bound under. Strictly increasing per
    /// [`SurfaceHandle`](crate::SurfaceHandle).
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current size.
    #[inline]
    #[must_use]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Current width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Current height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.size.height
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("generation", &self.generation)
            .field("size", &self.size)
            .field("window", &self.window)
            .finish()
    }
}
