use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// HTTP endpoint at which the transformation worker accepts requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceEndpoint {
    host: String,
    port: u16,
    path: String,
}

impl ServiceEndpoint {
    /// Builds a plain HTTP endpoint.
    ///
    /// A missing leading slash on `path` is added so the endpoint always
    /// renders as an absolute URL.
    #[must_use]
    pub fn http(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            host: host.into(),
            port,
            path,
        }
    }

    /// Host name or address of the worker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port of the worker.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Request path, always beginning with `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "http://{}:{}{}", self.host, self.port, self.path)
    }
}

impl FromStr for ServiceEndpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        if url.scheme() != "http" {
            return Err(EndpointParseError::UnsupportedScheme(url.scheme().to_owned()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| EndpointParseError::MissingHost(input.to_owned()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
        Ok(Self::http(host, port, url.path()))
    }
}

impl TryFrom<String> for ServiceEndpoint {
    type Error = EndpointParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceEndpoint> for String {
    fn from(endpoint: ServiceEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// Errors encountered while parsing a [`ServiceEndpoint`] from text.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// Only plain HTTP is spoken to the local worker.
    #[error("unsupported service scheme '{0}'; expected 'http'")]
    UnsupportedScheme(String),
    /// The URL carried no host.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// The URL carried no port and the scheme has no default.
    #[error("missing port in '{0}'")]
    MissingPort(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
