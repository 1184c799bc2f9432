//! Worker state and launch description types.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use pytransform_config::Config;

/// Observable lifecycle state of the worker process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerStatus {
    /// No worker is running; either never started or stopped on request.
    #[default]
    Stopped,
    /// A spawn is in progress.
    Starting,
    /// The process was spawned and has not exited.
    Running,
    /// The process exited without a stop request.
    Crashed,
}

impl WorkerStatus {
    /// Whether a worker process is, or is about to be, alive.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => formatter.write_str("stopped"),
            Self::Starting => formatter.write_str("starting"),
            Self::Running => formatter.write_str("running"),
            Self::Crashed => formatter.write_str("crashed"),
        }
    }
}

/// Logical handle to one spawned worker.
///
/// `id` increases with every spawn so a stale handle never matches a newer
/// worker. `pid` is absent while the spawn is still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerHandle {
    /// Supervisor-local generation number.
    pub id: u64,
    /// Operating system process id once spawned.
    pub pid: Option<u32>,
}

impl fmt::Display for WorkerHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(formatter, "worker #{} (pid {pid})", self.id),
            None => write!(formatter, "worker #{}", self.id),
        }
    }
}

/// Point-in-time view of the supervisor state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSnapshot {
    /// Current lifecycle state.
    pub status: WorkerStatus,
    /// Exit code of the last worker, when it exited normally.
    pub exit_code: Option<i32>,
    /// Handle of the active worker.
    pub handle: Option<WorkerHandle>,
}

/// Exit record delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// Handle of the worker that exited.
    pub handle: WorkerHandle,
    /// Exit code, absent when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Status recorded for the exit: `Stopped` or `Crashed`.
    pub status: WorkerStatus,
}

/// Result of a successful [`Supervisor::start`](super::Supervisor::start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new worker was spawned.
    Started(WorkerHandle),
    /// A worker was already starting or running; nothing was spawned.
    AlreadyRunning(WorkerHandle),
}

impl StartOutcome {
    /// Handle of the worker that is now active.
    #[must_use]
    pub const fn handle(&self) -> WorkerHandle {
        match self {
            Self::Started(handle) | Self::AlreadyRunning(handle) => *handle,
        }
    }
}

/// Result of a successful [`Supervisor::stop`](super::Supervisor::stop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Termination was issued; exit is observed asynchronously.
    Stopping(WorkerHandle),
    /// No worker was active.
    AlreadyStopped,
}

/// Everything needed to launch the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    working_dir: PathBuf,
    executable: OsString,
    entry_point: PathBuf,
    args: Vec<OsString>,
}

impl WorkerSpec {
    /// Describes a worker launched as `executable entry_point args...` from
    /// `working_dir`.
    pub fn new(
        working_dir: impl Into<PathBuf>,
        executable: impl Into<OsString>,
        entry_point: impl Into<PathBuf>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            executable: executable.into(),
            entry_point: entry_point.into(),
            args: Vec::new(),
        }
    }

    /// Appends extra arguments after the entry point.
    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builds the launch description from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.worker_dir().as_std_path(),
            config.worker_program(),
            config.worker_entry(),
        )
    }

    /// Directory the worker runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Executable launched.
    #[must_use]
    pub fn executable(&self) -> &OsStr {
        &self.executable
    }

    /// Entry point, relative to the working directory.
    #[must_use]
    pub fn entry_point(&self) -> &Path {
        &self.entry_point
    }

    /// Extra arguments after the entry point.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Human-readable command line used in guidance messages.
    #[must_use]
    pub fn display_command(&self) -> String {
        let mut command = format!(
            "{} {}",
            self.executable.to_string_lossy(),
            self.entry_point.display()
        );
        for arg in &self.args {
            command.push(' ');
            command.push_str(&arg.to_string_lossy());
        }
        command
    }
}
