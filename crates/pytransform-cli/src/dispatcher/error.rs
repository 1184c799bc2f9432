//! Dispatcher failures.

use thiserror::Error;

use crate::client::ClientError;
use crate::editor::EditError;
use crate::supervisor::{StartError, StopError};

/// Why a command did not complete.
///
/// Every failure is terminal to the one command that raised it.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A transform was requested without a document.
    #[error("no active document")]
    NoDocument,
    /// The document's language is not the configured one.
    #[error("this command is only available for {expected} files, not {language}")]
    UnsupportedLanguage {
        /// Language of the document.
        language: String,
        /// Configured language.
        expected: String,
    },
    /// Selection and document were both empty.
    #[error("no code to transform")]
    NothingToTransform,
    /// Another transform is still in flight.
    #[error("another transformation is already in progress")]
    Busy,
    /// The worker was not running and the user declined to start it.
    #[error("the transformation server is not running")]
    StartDeclined,
    /// The worker could not be started.
    #[error(transparent)]
    Start(#[from] StartError),
    /// The worker could not be stopped.
    #[error(transparent)]
    Stop(#[from] StopError),
    /// The exchange with the worker failed.
    #[error(transparent)]
    Service(#[from] ClientError),
    /// The result could not be applied.
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl DispatchError {
    /// Whether the failure means the service is not available, as opposed
    /// to the transformation or the document being at fault.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        match self {
            Self::StartDeclined | Self::Start(_) | Self::Stop(_) => true,
            Self::Service(error) => error.is_unavailable(),
            Self::NoDocument
            | Self::UnsupportedLanguage { .. }
            | Self::NothingToTransform
            | Self::Busy
            | Self::Edit(_) => false,
        }
    }
}
