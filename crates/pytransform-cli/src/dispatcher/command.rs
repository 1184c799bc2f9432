//! Commands the dispatcher accepts and the reports it returns.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::client::{Explanation, Operation, Validation};
use crate::editor::TextRange;
use crate::supervisor::WorkerHandle;

/// A user-invoked action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Make the current selection or document concise.
    Sugarize,
    /// Expand syntactic sugar in the current selection or document.
    Desugarize,
    /// Start the transformation worker.
    StartServer,
    /// Stop the transformation worker.
    StopServer,
}

impl Command {
    /// Transformation requested by the command, if it is a transform.
    #[must_use]
    pub const fn operation(self) -> Option<Operation> {
        match self {
            Self::Sugarize => Some(Operation::Sugarize),
            Self::Desugarize => Some(Operation::Desugarize),
            Self::StartServer | Self::StopServer => None,
        }
    }

    /// Name used on the command line and in the session loop.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sugarize => "sugarize",
            Self::Desugarize => "desugarize",
            Self::StartServer => "start",
            Self::StopServer => "stop",
        }
    }
}

impl From<Operation> for Command {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Sugarize => Self::Sugarize,
            Operation::Desugarize => Self::Desugarize,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Error returned when a command name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "sugarize" => Ok(Self::Sugarize),
            "desugarize" => Ok(Self::Desugarize),
            "start" | "start-server" => Ok(Self::StartServer),
            "stop" | "stop-server" => Ok(Self::StopServer),
            other => Err(UnknownCommand(other.to_owned())),
        }
    }
}

/// Outcome of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReport {
    /// A transformation was applied to the document.
    Transformed(TransformSummary),
    /// A lifecycle command completed.
    Server(ServerReport),
}

/// What a transform command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSummary {
    /// Transformation performed.
    pub operation: Operation,
    /// Range that was replaced, as resolved before the request.
    pub range: TextRange,
    /// Whether the range came from a selection rather than the whole
    /// document.
    pub from_selection: bool,
    /// Whether this command started the worker.
    pub started_worker: bool,
    /// Worker validation verdict.
    pub validation: Validation,
    /// Rewrites the worker reported.
    pub explanations: Vec<Explanation>,
}

/// Result of a start or stop command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerReport {
    /// A worker was spawned.
    Started(WorkerHandle),
    /// A worker was already active.
    AlreadyRunning(WorkerHandle),
    /// Termination was requested.
    Stopping(WorkerHandle),
    /// No worker was active.
    AlreadyStopped,
}
