//! The worker supervisor.
//!
//! [`Supervisor`] owns zero or one worker process. `start` and `stop` are
//! idempotent and never wait for the worker to exit; exit is reported by the
//! monitor thread, which is the only other writer of the supervisor state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::SUPERVISOR_TARGET;
use super::error::{StartError, StopError};
use super::monitoring::{drain_stream, watch_exit};
use super::spawning::{spawn_worker, validate_spec};
use super::terminate::{Terminate, is_already_gone, platform_terminator};
use super::types::{
    StartOutcome, StopOutcome, WorkerExit, WorkerHandle, WorkerSnapshot, WorkerSpec, WorkerStatus,
};

/// Callback invoked on the monitor thread whenever a worker exits.
pub type ExitListener = Arc<dyn Fn(&WorkerExit) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct ActiveWorker {
    handle: WorkerHandle,
    stop_requested: bool,
}

#[derive(Debug, Default)]
struct State {
    status: WorkerStatus,
    exit_code: Option<i32>,
    active: Option<ActiveWorker>,
    next_id: u64,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    listeners: Mutex<Vec<ExitListener>>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_exit(&self, id: u64, exit_code: Option<i32>) {
        let exit = {
            let mut state = self.lock_state();
            let Some(active) = state.active.take_if(|active| active.handle.id == id) else {
                return;
            };
            let status = if active.stop_requested {
                WorkerStatus::Stopped
            } else {
                WorkerStatus::Crashed
            };
            state.status = status;
            state.exit_code = exit_code;
            WorkerExit {
                handle: active.handle,
                exit_code,
                status,
            }
        };

        if exit.status == WorkerStatus::Crashed {
            warn!(
                target: SUPERVISOR_TARGET,
                worker = %exit.handle,
                exit_code = ?exit.exit_code,
                "worker exited unexpectedly"
            );
        } else {
            info!(
                target: SUPERVISOR_TARGET,
                worker = %exit.handle,
                exit_code = ?exit.exit_code,
                "worker stopped"
            );
        }

        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(&exit);
        }
    }
}

/// Owns the lifecycle of a single external worker process.
pub struct Supervisor {
    shared: Arc<Shared>,
    terminator: Box<dyn Terminate>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// Creates a supervisor using the platform's termination strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_terminator(platform_terminator())
    }

    /// Creates a supervisor with a custom termination strategy.
    #[must_use]
    pub fn with_terminator(terminator: Box<dyn Terminate>) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            terminator,
        }
    }

    /// Registers a callback invoked after every worker exit.
    pub fn on_exit(&self, listener: ExitListener) {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> WorkerStatus {
        self.shared.lock_state().status
    }

    /// Current lifecycle state together with the active handle and the last
    /// exit code.
    #[must_use]
    pub fn snapshot(&self) -> WorkerSnapshot {
        let state = self.shared.lock_state();
        WorkerSnapshot {
            status: state.status,
            exit_code: state.exit_code,
            handle: state.active.map(|active| active.handle),
        }
    }

    /// Starts the worker unless one is already starting or running.
    ///
    /// # Errors
    ///
    /// Returns [`StartError`] when the launch description is incomplete or
    /// the process cannot be spawned. The previous status is restored on
    /// failure.
    pub fn start(&self, spec: &WorkerSpec) -> Result<StartOutcome, StartError> {
        let (id, previous_status, previous_exit) = {
            let mut state = self.shared.lock_state();
            if let Some(active) = state.active {
                info!(
                    target: SUPERVISOR_TARGET,
                    worker = %active.handle,
                    "worker already active; start is a no-op"
                );
                return Ok(StartOutcome::AlreadyRunning(active.handle));
            }
            validate_spec(spec)?;
            let id = state.next_id;
            state.next_id += 1;
            let previous = (state.status, state.exit_code);
            state.active = Some(ActiveWorker {
                handle: WorkerHandle { id, pid: None },
                stop_requested: false,
            });
            state.status = WorkerStatus::Starting;
            state.exit_code = None;
            (id, previous.0, previous.1)
        };

        let mut child = match spawn_worker(spec) {
            Ok(child) => child,
            Err(error) => {
                self.abandon(id, previous_status, previous_exit);
                return Err(error);
            }
        };
        let pid = child.id();
        drain_stream(pid, "stdout", child.stdout.take());
        drain_stream(pid, "stderr", child.stderr.take());

        let shared = Arc::clone(&self.shared);
        if let Err(source) = watch_exit(child, move |exit_code| shared.record_exit(id, exit_code))
        {
            if let Err(error) = self.terminator.terminate(pid) {
                warn!(
                    target: SUPERVISOR_TARGET,
                    pid,
                    error = %error,
                    "failed to terminate unmonitored worker"
                );
            }
            self.abandon(id, previous_status, previous_exit);
            return Err(StartError::Monitor { pid, source });
        }

        let handle = WorkerHandle { id, pid: Some(pid) };
        let mut guard = self.shared.lock_state();
        let state = &mut *guard;
        if let Some(active) = state
            .active
            .as_mut()
            .filter(|active| active.handle.id == id)
        {
            active.handle = handle;
            state.status = WorkerStatus::Running;
            if active.stop_requested {
                // A stop arrived while the spawn was in flight.
                self.issue_termination(pid);
            }
        }
        drop(guard);

        info!(
            target: SUPERVISOR_TARGET,
            worker = %handle,
            command = %spec.display_command(),
            "worker started"
        );
        Ok(StartOutcome::Started(handle))
    }

    /// Requests termination of the active worker without waiting for exit.
    ///
    /// # Errors
    ///
    /// Returns [`StopError`] when termination cannot be delivered; the worker
    /// remains active in that case.
    pub fn stop(&self) -> Result<StopOutcome, StopError> {
        let mut state = self.shared.lock_state();
        let Some(active) = state.active.as_mut() else {
            return Ok(StopOutcome::AlreadyStopped);
        };
        let handle = active.handle;
        if active.stop_requested {
            return Ok(StopOutcome::Stopping(handle));
        }
        let Some(pid) = handle.pid else {
            active.stop_requested = true;
            return Ok(StopOutcome::Stopping(handle));
        };
        match self.terminator.terminate(pid) {
            Ok(()) => {}
            Err(error) if is_already_gone(&error) => {}
            Err(source) => return Err(StopError::Terminate { pid, source }),
        }
        active.stop_requested = true;
        info!(
            target: SUPERVISOR_TARGET,
            worker = %handle,
            "termination requested"
        );
        Ok(StopOutcome::Stopping(handle))
    }

    fn abandon(&self, id: u64, status: WorkerStatus, exit_code: Option<i32>) {
        let mut state = self.shared.lock_state();
        if state.active.take_if(|active| active.handle.id == id).is_some() {
            state.status = status;
            state.exit_code = exit_code;
        }
    }

    fn issue_termination(&self, pid: u32) {
        if let Err(error) = self.terminator.terminate(pid)
            && !is_already_gone(&error)
        {
            warn!(
                target: SUPERVISOR_TARGET,
                pid,
                error = %error,
                "failed to terminate worker after deferred stop"
            );
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Err(error) = self.stop() {
            warn!(
                target: SUPERVISOR_TARGET,
                error = %error,
                "failed to stop worker during shutdown"
            );
        }
    }
}
