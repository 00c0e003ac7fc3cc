//! Process-wide engine initialization.
//!
//! The native engine is initialized exactly once per process, before the
//! first `start()`, and never again for later start/stop cycles. This is an
//! explicit, checked initializer rather than a static constructor: callers
//! decide when it runs and see its error.

use std::fmt::Display;
use std::time::Instant;

use parking_lot::{const_mutex, Mutex};

use crate::error::{BridgeError, BridgeResult};

enum EngineState {
    Uninitialized,
    Ready { initialized_at: Instant },
}

static ENGINE: Mutex<EngineState> = const_mutex(EngineState::Uninitialized);

/// Runs `init` if the engine has not been initialized in this process.
///
/// Returns `Ok(true)` if this call performed the initialization and
/// `Ok(false)` if it had already happened (in which case `init` is not run).
/// Concurrent callers are serialized; exactly one of them runs `init`.
///
/// # Errors
///
/// Returns [`BridgeError::EngineInit`] if `init` fails. The engine stays
/// uninitialized, so a later call may retry.
pub fn initialize<F, E>(init: F) -> BridgeResult<bool>
where
    F: FnOnce() -> Result<(), E>,
    E: Display,
{
    let mut state = ENGINE.lock();
    if let EngineState::Ready { initialized_at } = *state {
        tracing::debug!(
            since_ms = initialized_at.elapsed().as_millis() as u64,
            "engine already initialized; skipping"
        );
        return Ok(false);
    }

    match init() {
        Ok(()) => {
            *state = EngineState::Ready {
                initialized_at: Instant::now(),
            };
            tracing::info!("engine initialized");
            Ok(true)
        }
        Err(e) => {
            tracing::error!(error = %e, "engine initialization failed");
            Err(BridgeError::EngineInit(e.to_string()))
        }
    }
}

/// True once [`initialize`] has succeeded in this process.
#[must_use]
pub fn is_initialized() -> bool {
    matches!(*ENGINE.lock(), EngineState::Ready { .. })
}

/// Fails unless the engine is initialized.
///
/// # Errors
///
/// Returns [`BridgeError::EngineNotInitialized`].
pub fn ensure_initialized() -> BridgeResult<()> {
    if is_initialized() {
        Ok(())
    } else {
        Err(BridgeError::EngineNotInitialized)
    }
}
