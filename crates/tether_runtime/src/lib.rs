//! # Tether Runtime
//!
//! The execution side of the bridge: one background thread per `start()`,
//! running a paced drain/apply/update/present loop against a
//! [`FrameDriver`], and the [`LoopController`] the host UI thread talks to.
//!
//! ## Threads
//!
//! | Thread    | Runs                                  | Touches                        |
//! |-----------|---------------------------------------|--------------------------------|
//! | UI        | `start`, `stop`, `report_*`           | queue (push), control lock     |
//! | Execution | [`ExecutionLoop`], the [`FrameDriver`]| queue (drain), surface slot    |
//!
//! ## Usage
//!
//! ```no_run
//! use tether_runtime::{engine, BridgeConfig, FnDriver, FrameDriver, LoopController};
//!
//! engine::initialize(|| Ok::<(), String>(())).unwrap();
//! let controller = LoopController::new(BridgeConfig::default(), || {
//!     let driver = FnDriver::new(|_dt| Ok(()), |_surface| Ok(()));
//!     Ok(Box::new(driver) as Box<dyn FrameDriver>)
//! })
//! .unwrap();
//!
//! controller.start().unwrap();
//! controller.report_resumed();
//! controller.stop().unwrap();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod controller;
pub mod driver;
pub mod engine;
pub mod error;
pub mod execution_loop;
pub mod shared;

#[cfg(test)]
mod test_support;

pub use config::BridgeConfig;
pub use controller::{LoopController, RunState};
pub use driver::{DriverFactory, FnDriver, FrameDriver};
pub use error::{BridgeError, BridgeResult, FrameError};
pub use execution_loop::{ExecutionLoop, Iteration, LoopPhase, LoopReport};
pub use shared::{SettleReport, SharedBridge};
