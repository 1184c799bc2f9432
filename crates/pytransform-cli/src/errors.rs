//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::client::ClientInitError;
use crate::dispatcher::DispatchError;
use crate::editor::EditError;
use crate::telemetry::TelemetryError;

/// Failures that end a CLI invocation.
#[derive(Debug, Error)]
pub enum AppError {
    /// A configuration layer was malformed.
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    /// The command line did not parse.
    #[error("{0}")]
    CliUsage(clap::Error),
    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The HTTP client could not be built.
    #[error(transparent)]
    Client(#[from] ClientInitError),
    /// The document could not be opened.
    #[error("failed to open document: {0}")]
    OpenDocument(#[source] EditError),
    /// The command failed; the user has already been told why.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// Reading session input failed.
    #[error("failed to read session input: {0}")]
    SessionInput(#[source] io::Error),
}

impl AppError {
    /// Whether the error was already reported through the notifier.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }
}
