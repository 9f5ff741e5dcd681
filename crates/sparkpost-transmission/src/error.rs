//! Error types for the transmission client
//!
//! A transmission resolves to a success or to one of three error kinds that
//! callers branch on:
//! - [`SchemaError`]: a payload or reply did not match its declared shape
//! - [`TransmissionFailed`]: a well-formed 400 reply rejecting the send
//! - [`TransportError`]: anything raised by the transport, including
//!   statuses the classifier does not own

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::contracts::TransmissionFailure;

/// Which declared shape a value failed to match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaShape {
    /// Outgoing transmission payload
    Request,
    /// 200 reply body
    SuccessResponse,
    /// 400 reply body
    FailureResponse,
}

impl SchemaShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaShape::Request => "transmission request",
            SchemaShape::SuccessResponse => "transmission success response",
            SchemaShape::FailureResponse => "transmission failure response",
        }
    }
}

impl fmt::Display for SchemaShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value failed coercion against its declared shape
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("Schema error in {shape}: {}", .diagnostics.join("; "))]
pub struct SchemaError {
    pub shape: SchemaShape,

    /// Raw coercion diagnostics, one per violation
    pub diagnostics: Vec<String>,
}

impl SchemaError {
    pub fn new(shape: SchemaShape, diagnostics: Vec<String>) -> Self {
        Self { shape, diagnostics }
    }

    pub fn single(shape: SchemaShape, diagnostic: impl Into<String>) -> Self {
        Self::new(shape, vec![diagnostic.into()])
    }
}

/// The API accepted the request but rejected the transmission (HTTP 400)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Transmission failed: {message}")]
pub struct TransmissionFailed {
    /// Message of the first reported error
    pub message: String,

    /// Full reply, every error entry included
    pub failure: TransmissionFailure,
}

impl TransmissionFailed {
    pub fn new(failure: TransmissionFailure) -> Self {
        Self {
            message: failure.primary_message().to_string(),
            failure,
        }
    }
}

/// Errors raised below the classifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Any status other than 200 or 400
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("No async runtime available: {0}")]
    Runtime(String),

    #[error("Transmission task ended without delivering a result")]
    ChannelClosed,
}

/// Terminal error of a single transmission
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransmissionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Failed(#[from] TransmissionFailed),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl TransmissionError {
    pub fn is_schema_error(&self) -> bool {
        matches!(self, TransmissionError::Schema(_))
    }

    pub fn is_business_failure(&self) -> bool {
        matches!(self, TransmissionError::Failed(_))
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, TransmissionError::Transport(_))
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TransmissionError::Schema(_) => "schema_error",
            TransmissionError::Failed(_) => "failed",
            TransmissionError::Transport(_) => "transport_error",
        }
    }
}

/// Configuration and client construction errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Result type alias for transmission operations
pub type Result<T> = std::result::Result<T, TransmissionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::ApiError;

    fn failure(messages: &[&str]) -> TransmissionFailure {
        TransmissionFailure {
            errors: messages
                .iter()
                .map(|m| ApiError {
                    description: "d".to_string(),
                    code: "1902".to_string(),
                    message: m.to_string(),
                    extra: Default::default(),
                })
                .collect(),
            extra: Default::default(),
        }
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::new(
            SchemaShape::Request,
            vec!["a: bad".to_string(), "b: worse".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Schema error in transmission request: a: bad; b: worse"
        );
    }

    #[test]
    fn test_transmission_failed_uses_first_message() {
        let err = TransmissionFailed::new(failure(&["bad recipient", "other"]));
        assert_eq!(err.message, "bad recipient");
        assert_eq!(err.to_string(), "Transmission failed: bad recipient");
        assert_eq!(err.failure.errors.len(), 2);
    }

    #[test]
    fn test_error_kinds() {
        let schema: TransmissionError = SchemaError::single(SchemaShape::SuccessResponse, "x").into();
        let failed: TransmissionError = TransmissionFailed::new(failure(&["m"])).into();
        let transport: TransmissionError = TransportError::Timeout(100).into();

        assert!(schema.is_schema_error());
        assert!(failed.is_business_failure());
        assert!(transport.is_transport_error());
        assert_eq!(schema.kind(), "schema_error");
        assert_eq!(failed.kind(), "failed");
        assert_eq!(transport.kind(), "transport_error");
    }

    #[test]
    fn test_transport_error_passes_display_through() {
        let err: TransmissionError = TransportError::UnexpectedStatus {
            status: 503,
            body: "down".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Unexpected status 503: down");
    }
}
