//! Gateway error taxonomy and its mapping onto caller-facing responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::response::{relay, UpstreamResponse};

/// Errors that can occur while serving a gateway operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller omitted or malformed a parameter. Carries the caller-facing code.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No credential could be resolved for the upstream.
    #[error("missing credential: {}", .candidates.join(" or "))]
    MissingCredential { candidates: Vec<&'static str> },

    /// Transport-level failure reaching the upstream.
    #[error("network error calling {upstream}: {source}")]
    Network {
        upstream: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status.
    #[error("upstream responded with {}", .0.status())]
    Upstream(UpstreamResponse),

    /// Upstream answered 2xx but the body was not JSON.
    #[error("upstream returned a non-JSON body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("invalid path template: {0}")]
    InvalidTemplate(String),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid value for header {0}")]
    InvalidHeader(&'static str),

    /// The AWS SDK gave up before any answer arrived.
    #[error("{upstream} call failed: {message}")]
    Sdk { upstream: &'static str, message: String },

    /// Caller-supplied image URL answered non-2xx. The body is not kept.
    #[error("image download responded with {status}")]
    ImageDownload { status: StatusCode },

    #[error("image exceeds {limit} bytes")]
    ImageTooLarge { limit: usize },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl GatewayError {
    pub fn validation(code: impl Into<String>) -> Self {
        Self::Validation(code.into())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A [`GatewayError`] tagged with the operation-specific error code that is
/// reported to callers for local failures.
#[derive(Debug)]
pub struct OperationError {
    operation: &'static str,
    source: GatewayError,
}

impl OperationError {
    pub fn new(operation: &'static str, source: GatewayError) -> Self {
        Self { operation, source }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn source(&self) -> &GatewayError {
        &self.source
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let operation = self.operation;
        match self.source {
            GatewayError::Validation(code) => {
                tracing::warn!(operation, error = %code, "Rejected request");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": code }))).into_response()
            }
            GatewayError::MissingCredential { candidates } => {
                let code = format!("missing {}", candidates.join(" or "));
                tracing::error!(operation, error = %code, "Gateway misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": code }))).into_response()
            }
            GatewayError::ImageTooLarge { limit } => {
                tracing::warn!(operation, limit, "Rejected oversized image");
                (StatusCode::PAYLOAD_TOO_LARGE, Json(json!({ "error": "image too large" }))).into_response()
            }
            GatewayError::ImageDownload { status } => {
                tracing::warn!(operation, status = status.as_u16(), "Image download failed");
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": "image-download-failed" }))).into_response()
            }
            GatewayError::Upstream(response) => {
                tracing::warn!(
                    operation,
                    status = response.status().as_u16(),
                    "Passing upstream error through"
                );
                relay(response)
            }
            other => {
                tracing::error!(operation, error = %other, "Operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": operation })))
                    .into_response()
            }
        }
    }
}

/// Attach an operation code to a gateway result.
pub trait OperationResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T, OperationError>;
}

impl<T> OperationResultExt<T> for GatewayResult<T> {
    fn during(self, operation: &'static str) -> Result<T, OperationError> {
        self.map_err(|source| OperationError::new(operation, source))
    }
}

/// What every operation handler returns.
pub type OperationResult = Result<Response, OperationError>;
