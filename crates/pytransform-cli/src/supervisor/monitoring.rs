//! Worker exit monitoring and output draining.
//!
//! Each spawned worker gets a monitor thread that blocks on `wait` and
//! reports the exit back to the supervisor, plus one drain thread per piped
//! stream forwarding worker output to tracing.

use std::io::{self, BufRead, BufReader, Read};
use std::process::Child;
use std::thread;

use tracing::{debug, warn};

use super::SUPERVISOR_TARGET;

/// Spawns a thread that waits for `child` and hands its exit code to
/// `on_exit`.
///
/// The exit code is `None` when the process was terminated by a signal or
/// when waiting failed.
pub(super) fn watch_exit<F>(mut child: Child, on_exit: F) -> io::Result<()>
where
    F: FnOnce(Option<i32>) + Send + 'static,
{
    let pid = child.id();
    thread::Builder::new()
        .name(format!("worker-exit-{pid}"))
        .spawn(move || {
            let exit_code = match child.wait() {
                Ok(status) => status.code(),
                Err(error) => {
                    warn!(
                        target: SUPERVISOR_TARGET,
                        pid,
                        error = %error,
                        "failed to wait for worker exit"
                    );
                    None
                }
            };
            on_exit(exit_code);
        })
        .map(|_| ())
}

/// Forwards each line of a worker stream to tracing until the stream
/// closes.
pub(super) fn drain_stream<R>(pid: u32, label: &'static str, stream: Option<R>)
where
    R: Read + Send + 'static,
{
    let Some(stream) = stream else {
        return;
    };
    let spawned = thread::Builder::new()
        .name(format!("worker-{label}-{pid}"))
        .spawn(move || {
            for line in BufReader::new(stream).lines() {
                match line {
                    Ok(line) => debug!(
                        target: SUPERVISOR_TARGET,
                        pid,
                        stream = label,
                        "{line}"
                    ),
                    Err(_) => break,
                }
            }
        });
    if let Err(error) = spawned {
        warn!(
            target: SUPERVISOR_TARGET,
            pid,
            stream = label,
            error = %error,
            "failed to drain worker output"
        );
    }
}
