//! Wire types for the worker's HTTP contract.
//!
//! Requests are `{code, operation}`. Successful responses carry exactly one of
//! `sugared_code` or `desugared_code` alongside `validation` and
//! `explanations`; failures carry `{"status": "error", "message": ...}` or a
//! non-success HTTP status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ClientError;

/// The two transformations the worker offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Rewrite code into its concise, sugared form.
    Sugarize,
    /// Expand syntactic sugar into explicit code.
    Desugarize,
}

impl Operation {
    /// Wire name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sugarize => "sugarize",
            Self::Desugarize => "desugarize",
        }
    }

    /// Response field holding the transformed code.
    #[must_use]
    pub const fn result_field(self) -> &'static str {
        match self {
            Self::Sugarize => "sugared_code",
            Self::Desugarize => "desugared_code",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One transformation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformRequest {
    code: String,
    operation: Operation,
}

impl TransformRequest {
    /// Builds a request for `operation` over `code`.
    pub fn new(code: impl Into<String>, operation: Operation) -> Self {
        Self {
            code: code.into(),
            operation,
        }
    }

    /// Source text sent to the worker.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Requested transformation.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }
}

/// Validation verdict the worker attaches to every result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Validation {
    /// Whether the transformed code passed the worker's checks.
    pub is_valid: bool,
    /// Problems found by the worker, if any.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// A single transformation the worker applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Explanation {
    /// Kind of rewrite, e.g. `list_comprehension`.
    pub transformation_type: String,
    /// Human-readable description.
    pub explanation: String,
}

/// A fully populated transformation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Code to write back into the document.
    pub transformed_code: String,
    /// Worker validation verdict.
    pub validation: Validation,
    /// Rewrites applied, possibly empty.
    pub explanations: Vec<Explanation>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sugared_code: Option<String>,
    #[serde(default)]
    desugared_code: Option<String>,
    // Older workers answered desugarize with this field.
    #[serde(default)]
    expanded_code: Option<String>,
    #[serde(default)]
    validation: Option<Validation>,
    #[serde(default)]
    explanations: Vec<Explanation>,
}

#[derive(Debug, Deserialize)]
struct WireFailure {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Interprets an HTTP status and body as a [`TransformResult`].
///
/// # Errors
///
/// Returns [`ClientError::ServerError`] for non-success statuses or an
/// error-shaped body, and [`ClientError::MalformedResponse`] when a success
/// body lacks the fields a result needs.
pub(crate) fn decode_response(
    operation: Operation,
    status: u16,
    body: &str,
) -> Result<TransformResult, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::ServerError {
            status: Some(status),
            message: failure_message(status, body),
        });
    }

    let wire: WireResponse =
        serde_json::from_str(body).map_err(|error| ClientError::MalformedResponse {
            detail: format!("response body is not a transform result: {error}"),
        })?;

    if wire.status.as_deref() == Some("error") {
        return Err(ClientError::ServerError {
            status: Some(status),
            message: wire
                .message
                .unwrap_or_else(|| String::from("the worker reported an unspecified error")),
        });
    }

    let transformed_code = match operation {
        Operation::Sugarize => wire.sugared_code,
        Operation::Desugarize => wire.desugared_code.or(wire.expanded_code),
    }
    .ok_or_else(|| ClientError::MalformedResponse {
        detail: format!("response is missing `{}`", operation.result_field()),
    })?;

    let validation = wire
        .validation
        .ok_or_else(|| ClientError::MalformedResponse {
            detail: String::from("response is missing `validation`"),
        })?;

    Ok(TransformResult {
        transformed_code,
        validation,
        explanations: wire.explanations,
    })
}

fn failure_message(status: u16, body: &str) -> String {
    serde_json::from_str::<WireFailure>(body)
        .ok()
        .and_then(|failure| failure.message.or(failure.error))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| format!("the worker answered with HTTP {status}"))
}
