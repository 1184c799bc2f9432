//! Worker process spawning utilities.
//!
//! Validates the launch description and spawns the worker with piped output
//! so its chatter never interleaves with the host's own streams.

use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::SUPERVISOR_TARGET;
use super::error::StartError;
use super::types::WorkerSpec;

/// Checks that the working directory exists and contains the entry point.
pub(super) fn validate_spec(spec: &WorkerSpec) -> Result<(), StartError> {
    if !spec.working_dir().is_dir() {
        return Err(StartError::MissingWorkingDirectory {
            path: spec.working_dir().to_path_buf(),
        });
    }
    let entry = spec.working_dir().join(spec.entry_point());
    if !entry.exists() {
        return Err(StartError::MissingEntryPoint { path: entry });
    }
    Ok(())
}

/// Spawns the worker described by `spec`.
///
/// Returns as soon as the operating system confirms the spawn; readiness to
/// accept connections is not awaited here.
pub(super) fn spawn_worker(spec: &WorkerSpec) -> Result<Child, StartError> {
    let mut command = Command::new(spec.executable());
    command
        .arg(spec.entry_point())
        .args(spec.args())
        .current_dir(spec.working_dir())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(
        target: SUPERVISOR_TARGET,
        command = %spec.display_command(),
        working_dir = %spec.working_dir().display(),
        "spawning worker process"
    );

    command.spawn().map_err(|source| StartError::Spawn {
        executable: spec.executable().to_os_string(),
        source,
    })
}
