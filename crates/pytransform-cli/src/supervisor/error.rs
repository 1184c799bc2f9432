//! Error types for worker lifecycle operations.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting the worker.
#[derive(Debug, Error)]
pub enum StartError {
    /// The configured working directory does not exist.
    #[error("worker directory {path:?} does not exist")]
    MissingWorkingDirectory {
        /// Directory that was checked.
        path: PathBuf,
    },
    /// The working directory lacks the entry point.
    #[error("worker entry point {path:?} does not exist")]
    MissingEntryPoint {
        /// Entry point that was checked.
        path: PathBuf,
    },
    /// The operating system refused to spawn the process.
    #[error("failed to spawn worker '{executable:?}': {source}")]
    Spawn {
        /// Executable that failed to launch.
        executable: OsString,
        /// Underlying cause, e.g. not found or permission denied.
        #[source]
        source: io::Error,
    },
    /// The exit monitor thread could not be created; the worker was
    /// terminated.
    #[error("failed to monitor worker pid {pid}: {source}")]
    Monitor {
        /// Process id of the terminated worker.
        pid: u32,
        /// Thread creation failure.
        #[source]
        source: io::Error,
    },
}

/// Errors raised while stopping the worker.
#[derive(Debug, Error)]
pub enum StopError {
    /// Termination could not be delivered.
    #[error("failed to terminate worker pid {pid}: {source}")]
    Terminate {
        /// Process id of the worker.
        pid: u32,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },
}
