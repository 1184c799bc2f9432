//! HTTP client for the transformation worker.
//!
//! [`TransformService`] is the seam the dispatcher talks through;
//! [`HttpTransformClient`] implements it with one blocking POST per request.
//! The client performs no retries and never touches supervisor state.

mod error;
mod probe;
mod protocol;

use std::time::Duration;

use pytransform_config::{Config, ServiceEndpoint};
use reqwest::blocking::Client;
use tracing::{debug, warn};

pub use error::{ClientError, ClientInitError};
pub use protocol::{Explanation, Operation, TransformRequest, TransformResult, Validation};

use probe::endpoint_is_reachable;
use protocol::decode_response;

/// Tracing target for client events.
pub(crate) const CLIENT_TARGET: &str = "pytransform::client";

/// One request/response exchange with the worker.
#[cfg_attr(test, mockall::automock)]
pub trait TransformService: Send + Sync {
    /// Sends `request` and classifies the outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] describing why no result was produced.
    fn transform(&self, request: &TransformRequest) -> Result<TransformResult, ClientError>;

    /// Whether the worker endpoint currently accepts connections.
    fn probe(&self) -> bool;
}

/// [`TransformService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransformClient {
    http: Client,
    endpoint: ServiceEndpoint,
    connect_timeout: Duration,
}

impl HttpTransformClient {
    /// Builds a client bound to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientInitError`] when the HTTP stack cannot be initialised.
    pub fn new(
        endpoint: ServiceEndpoint,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ClientInitError> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            connect_timeout,
        })
    }

    /// Builds a client from the configured endpoint and bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientInitError`] when the HTTP stack cannot be initialised.
    pub fn from_config(config: &Config) -> Result<Self, ClientInitError> {
        Self::new(
            config.service_url().clone(),
            config.connect_timeout(),
            config.request_timeout(),
        )
    }

    /// Endpoint the client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }
}

impl TransformService for HttpTransformClient {
    fn transform(&self, request: &TransformRequest) -> Result<TransformResult, ClientError> {
        let url = self.endpoint.to_string();
        debug!(
            target: CLIENT_TARGET,
            endpoint = %url,
            operation = %request.operation(),
            bytes = request.code().len(),
            "sending transform request"
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .map_err(|error| ClientError::from_transport(&url, &error))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| ClientError::from_transport(&url, &error))?;

        let outcome = decode_response(request.operation(), status, &body);
        match &outcome {
            Ok(result) => debug!(
                target: CLIENT_TARGET,
                status,
                valid = result.validation.is_valid,
                explanations = result.explanations.len(),
                "transform succeeded"
            ),
            Err(ClientError::MalformedResponse { detail }) => warn!(
                target: CLIENT_TARGET,
                status,
                detail = %detail,
                body = %body,
                "worker response violated the transform contract"
            ),
            Err(error) => debug!(
                target: CLIENT_TARGET,
                status,
                error = %error,
                "worker reported a failure"
            ),
        }
        outcome
    }

    fn probe(&self) -> bool {
        endpoint_is_reachable(&self.endpoint, self.connect_timeout)
    }
}
