//! Failure classification for worker exchanges.

use thiserror::Error;

/// Why a transform exchange produced no result.
///
/// Each variant maps to one recovery path in the dispatcher: the first two
/// mean the service is not available, the last two mean it answered badly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Nothing accepted the connection, or it was dropped before a response
    /// arrived.
    #[error("transformation service at {endpoint} is unreachable: {detail}")]
    Unreachable {
        /// Endpoint that was contacted.
        endpoint: String,
        /// Transport-level cause.
        detail: String,
    },
    /// No response within the configured bound.
    #[error("transformation service at {endpoint} did not respond in time")]
    Timeout {
        /// Endpoint that was contacted.
        endpoint: String,
    },
    /// The worker answered with a processing failure.
    #[error("transformation failed: {message}")]
    ServerError {
        /// HTTP status, when the failure came from the status line.
        status: Option<u16>,
        /// The worker's own message.
        message: String,
    },
    /// The worker answered with something that is not a transform result.
    #[error("transformation service returned an unexpected response: {detail}")]
    MalformedResponse {
        /// What was wrong with the body.
        detail: String,
    },
}

impl ClientError {
    /// Whether the error means the service is not available, as opposed to
    /// having answered.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }

    pub(crate) fn from_transport(endpoint: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_owned(),
            }
        } else {
            // Refused, unresolved, reset, or closed before the response: all
            // mean no worker is serving the endpoint right now.
            Self::Unreachable {
                endpoint: endpoint.to_owned(),
                detail: error.to_string(),
            }
        }
    }
}

/// Failure to construct the HTTP client.
#[derive(Debug, Error)]
#[error("failed to build HTTP client: {source}")]
pub struct ClientInitError {
    #[source]
    source: reqwest::Error,
}

impl From<reqwest::Error> for ClientInitError {
    fn from(source: reqwest::Error) -> Self {
        Self { source }
    }
}
