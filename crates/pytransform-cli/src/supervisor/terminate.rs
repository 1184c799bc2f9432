//! Platform-specific worker termination.
//!
//! POSIX hosts signal the worker directly; Windows hosts kill the whole
//! process tree because the worker may spawn children of its own.

use std::io;
use std::process::{Command, Stdio};

#[cfg(unix)]
use libc::{SIGTERM, kill};

/// Capability to terminate a worker by process id.
///
/// Implementations must not wait for the process to exit; exit is observed
/// by the supervisor's monitor thread.
pub trait Terminate: Send + Sync {
    /// Requests termination of `pid`.
    ///
    /// # Errors
    ///
    /// Returns the operating system error when the request cannot be
    /// delivered.
    fn terminate(&self, pid: u32) -> io::Result<()>;
}

/// Sends `SIGTERM` to the worker.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalTerminator;

impl Terminate for SignalTerminator {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            let pid = libc::pid_t::try_from(pid).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "pid exceeds pid_t range")
            })?;
            // SAFETY: `kill(2)` is memory-safe even when the PID is invalid; the
            // kernel simply returns an error.
            let result = unsafe { kill(pid, SIGTERM) };
            if result == 0 {
                Ok(())
            } else {
                Err(io::Error::last_os_error())
            }
        }
        #[cfg(not(unix))]
        {
            let _ = pid;
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "signal termination is unsupported on this platform",
            ))
        }
    }
}

/// Forcefully kills the worker and its descendants with `taskkill`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeKillTerminator;

impl Terminate for TreeKillTerminator {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        let status = Command::new("taskkill")
            .args(["/pid", &pid.to_string(), "/f", "/t"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("taskkill exited with {status}")))
        }
    }
}

/// Selects the termination strategy for the build target.
#[must_use]
pub fn platform_terminator() -> Box<dyn Terminate> {
    if cfg!(windows) {
        Box::new(TreeKillTerminator)
    } else {
        Box::new(SignalTerminator)
    }
}

/// Whether a termination error means the process had already exited.
pub(super) fn is_already_gone(error: &io::Error) -> bool {
    #[cfg(unix)]
    {
        error.raw_os_error() == Some(libc::ESRCH)
    }
    #[cfg(not(unix))]
    {
        let _ = error;
        false
    }
}
