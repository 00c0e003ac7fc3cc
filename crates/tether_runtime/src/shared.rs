//! State shared by the UI side and the execution thread.
//!
//! The queue and the surface slot are the only channels between the two
//! sides. `live` records whether an execution thread is currently consuming
//! the queue; it decides who resolves a surface release ticket. Flipping it
//! and checking it both happen under its lock, so a reporter and a loop that
//! is starting or stopping never both think the other one will unbind.

use parking_lot::Mutex;
use tether_core::{Event, EventQueue, Surface, SurfaceHandle, SurfaceRelease};

/// Counts from settling leftover events without a running loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Surface events applied to the slot.
    pub applied: u64,
    /// Input and lifecycle events dropped.
    pub discarded: u64,
}

/// The queue, the surface slot, and the liveness flag of one controller.
#[derive(Debug, Default)]
pub struct SharedBridge {
    queue: EventQueue,
    surface: SurfaceHandle,
    live: Mutex<bool>,
}

impl SharedBridge {
    /// Creates an empty bridge with no loop attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The event queue.
    #[must_use]
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// The surface slot.
    #[must_use]
    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    /// True while an execution loop is consuming the queue.
    #[must_use]
    pub fn is_live(&self) -> bool {
        *self.live.lock()
    }

    pub(crate) fn set_live(&self) {
        *self.live.lock() = true;
    }

    /// Queues a surface destruction and returns its release ticket.
    ///
    /// With a loop live, the loop resolves the ticket once it has unbound the
    /// window. With none, the caller unbinds the slot here and drops every
    /// queued creation or resize, so no later run can bind the window; the
    /// ticket is resolved before this returns.
    pub fn push_surface_destroyed(&self) -> SurfaceRelease {
        let ticket = SurfaceRelease::pending();
        let live = self.live.lock();
        if *live {
            self.queue.push(Event::SurfaceDestroyed(ticket.clone()));
        } else {
            self.release_without_loop(&ticket);
        }
        drop(live);
        ticket
    }

    fn release_without_loop(&self, ticket: &SurfaceRelease) {
        let dropped = self.queue.purge(|event| {
            matches!(event, Event::SurfaceCreated { .. } | Event::SurfaceChanged(_))
        });
        let previous = self.surface.unbind();
        tracing::debug!(
            dropped,
            generation = previous.as_ref().map(Surface::generation),
            "surface released with no loop running"
        );
        drop(previous);
        ticket.mark_released();
    }

    /// Marks the loop gone and settles everything still queued.
    pub(crate) fn settle_pending(&self) -> SettleReport {
        let mut live = self.live.lock();
        *live = false;
        let mut report = SettleReport::default();
        for event in self.queue.drain_all() {
            self.settle(event, &mut report);
        }
        drop(live);
        report
    }

    /// Applies a surface event to the slot without a driver, or drops
    /// anything else.
    pub(crate) fn settle(&self, event: Event, report: &mut SettleReport) {
        match event {
            Event::SurfaceCreated { window, size } => {
                self.surface.bind(window, size);
                report.applied += 1;
            }
            Event::SurfaceChanged(size) => {
                self.surface.update_size(size);
                report.applied += 1;
            }
            Event::SurfaceDestroyed(ticket) => {
                self.surface.unbind();
                ticket.mark_released();
                report.applied += 1;
            }
            other => {
                tracing::trace!(kind = %other.kind(), "discarding event with no loop running");
                report.discarded += 1;
            }
        }
    }
}
