//! The current-surface slot.
//!
//! Written only by the execution loop (while applying surface events) and
//! read by the loop at frame start and by anyone asking for diagnostics. The
//! slot holds window, generation and size as one value behind an `RwLock`, so
//! `current()` returns either the old surface or the new one, never a mix.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::surface::{NativeWindow, Surface, SurfaceSize};

#[derive(Default)]
struct Slot {
    surface: Option<Surface>,
    last_generation: u64,
}

/// Shared, possibly-empty reference to the current drawable target.
#[derive(Default)]
pub struct SurfaceHandle {
    slot: RwLock<Slot>,
}

impl SurfaceHandle {
    /// Creates an unbound handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a new surface, replacing any previous one in a single step.
    ///
    /// Returns the generation assigned to the new surface.
    pub fn bind(&self, window: Arc<dyn NativeWindow>, size: SurfaceSize) -> u64 {
        let mut slot = self.slot.write();
        slot.last_generation += 1;
        let generation = slot.last_generation;
        let previous = slot.surface.replace(Surface::new(window, generation, size));
        drop(slot);

        if let Some(previous) = previous {
            tracing::debug!(
                replaced = previous.generation(),
                generation,
                "surface rebound without destroy"
            );
        }
        generation
    }

    /// Resizes the bound surface in place.
    ///
    /// Returns false (and does nothing) if no surface is bound; a late resize
    /// for a surface that is already gone is not an error.
    pub fn update_size(&self, size: SurfaceSize) -> bool {
        let mut slot = self.slot.write();
        match slot.surface.as_mut() {
            Some(surface) => {
                surface.set_size(size);
                true
            }
            None => false,
        }
    }

    /// Unbinds the current surface and returns it.
    ///
    /// After this returns, `current()` yields `None` until the next `bind`,
    /// so no frame that starts afterwards can present to the old window.
    pub fn unbind(&self) -> Option<Surface> {
        self.slot.write().surface.take()
    }

    /// Snapshot of the bound surface.
    #[must_use]
    pub fn current(&self) -> Option<Surface> {
        self.slot.read().surface.clone()
    }

    /// True if a surface is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.slot.read().surface.is_some()
    }

    /// Generation of the bound surface, if any.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.slot.read().surface.as_ref().map(Surface::generation)
    }
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("SurfaceHandle")
            .field("surface", &slot.surface)
            .field("last_generation", &slot.last_generation)
            .finish()
    }
}
