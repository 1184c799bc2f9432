//! Ownership and lifecycle of the external transformation worker.
//!
//! The module is split into focused submodules:
//! - [`types`] defines the observable worker state and launch description.
//! - [`error`] captures start and stop failures.
//! - [`spawning`] validates the launch description and spawns the process.
//! - [`monitoring`] waits for worker exit and drains its output streams.
//! - [`terminate`] abstracts platform-specific termination.
//! - [`controller`] implements the [`Supervisor`] itself.

mod controller;
mod error;
mod monitoring;
mod spawning;
mod terminate;
mod types;


pub use controller::{ExitListener, Supervisor};
pub use error::{StartError, StopError};
pub use terminate::{SignalTerminator, Terminate, TreeKillTerminator, platform_terminator};
pub use types::{
    StartOutcome, StopOutcome, WorkerExit, WorkerHandle, WorkerSnapshot, WorkerSpec, WorkerStatus,
};

/// Tracing target for supervisor events.
pub(crate) const SUPERVISOR_TARGET: &str = "pytransform::supervisor";
