//! # Bridge Configuration
//!
//! Parsed once, before the first `start()`. Every key is optional in TOML:
//!
//! ```toml
//! target_fps = 60
//! max_frame_delta_ms = 100
//! max_consecutive_failures = 8
//! thread_name = "tether-loop"
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::{BridgeError, BridgeResult};

/// Default frame rate when the host does not say otherwise.
pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Configuration for a [`LoopController`](crate::LoopController).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Frames per second the loop paces itself to.
    pub target_fps: u32,
    /// Upper bound on the delta handed to the simulation (milliseconds).
    pub max_frame_delta_ms: u64,
    /// Transient frame failures in a row before the loop gives up.
    pub max_consecutive_failures: u32,
    /// Name given to the execution thread.
    pub thread_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            // Clamp delta time to prevent simulation explosion after a stall
            max_frame_delta_ms: 100,
            max_consecutive_failures: 8,
            thread_name: "tether-loop".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] on syntax errors, unknown keys,
    /// or values rejected by [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> BridgeResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.target_fps == 0 {
            return Err(BridgeError::InvalidConfig(
                "target_fps must be at least 1".to_string(),
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(BridgeError::InvalidConfig(
                "max_consecutive_failures must be at least 1".to_string(),
            ));
        }
        if self.thread_name.is_empty() {
            return Err(BridgeError::InvalidConfig(
                "thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Time between two paced frames.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }

    /// Largest delta passed to the simulation step.
    #[must_use]
    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }
}
