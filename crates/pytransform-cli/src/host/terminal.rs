//! Line-oriented terminal front end.
//!
//! Implements [`Prompt`] and [`Notify`] over plain reader/writer handles so
//! the same code drives a real terminal and in-memory test buffers. Notices
//! and progress go to stderr; command output goes to stdout.

use std::io::{self, BufRead, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::dispatcher::{Notify, Prompt};

/// Terminal streams shared by the prompt, the notifier and the session loop.
pub(crate) struct Terminal<R, W, E> {
    input: Mutex<R>,
    stdout: Mutex<W>,
    stderr: Mutex<E>,
    assume_yes: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R, W, E> Terminal<R, W, E>
where
    R: BufRead + Send,
    W: Write + Send,
    E: Write + Send,
{
    pub(crate) fn new(input: R, stdout: W, stderr: E, assume_yes: bool) -> Self {
        Self {
            input: Mutex::new(input),
            stdout: Mutex::new(stdout),
            stderr: Mutex::new(stderr),
            assume_yes,
        }
    }

    /// Next input line without its terminator, or `None` at end of input.
    pub(crate) fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if lock(&self.input).read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(|c| c == '\r' || c == '\n').len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Writes command output.
    pub(crate) fn print(&self, text: &str) {
        let mut stdout = lock(&self.stdout);
        let _ = writeln!(stdout, "{text}");
        let _ = stdout.flush();
    }

    fn notice(&self, prefix: &str, message: &str) {
        let mut stderr = lock(&self.stderr);
        let _ = writeln!(stderr, "{prefix}{message}");
        let _ = stderr.flush();
    }
}

impl<R, W, E> Prompt for Terminal<R, W, E>
where
    R: BufRead + Send,
    W: Write + Send,
    E: Write + Send,
{
    fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            self.notice("", &format!("{question} [y/N] y"));
            return true;
        }
        {
            let mut stderr = lock(&self.stderr);
            let _ = write!(stderr, "{question} [y/N] ");
            let _ = stderr.flush();
        }
        match self.read_line() {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) | Err(_) => false,
        }
    }
}

impl<R, W, E> Notify for Terminal<R, W, E>
where
    R: BufRead + Send,
    W: Write + Send,
    E: Write + Send,
{
    fn info(&self, message: &str) {
        self.notice("", message);
    }

    fn warn(&self, message: &str) {
        self.notice("warning: ", message);
    }

    fn error(&self, message: &str) {
        self.notice("error: ", message);
    }

    fn begin_progress(&self, title: &str) {
        self.notice("", title);
    }

    fn end_progress(&self) {}
}
