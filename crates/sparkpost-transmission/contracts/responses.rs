//! Transmission reply shapes
//!
//! Both shapes are open: fields the API adds beyond the required ones are kept
//! in `extra` instead of being rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JsonObject;
use crate::error::{SchemaError, SchemaShape};

/// 200 reply body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionSuccess {
    pub results: TransmissionResults,

    #[serde(flatten)]
    pub extra: JsonObject,
}

/// `results` object of a 200 reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionResults {
    /// Transmission id assigned by the API
    pub id: String,

    pub total_accepted_recipients: u64,

    pub total_rejected_recipients: u64,

    #[serde(flatten)]
    pub extra: JsonObject,
}

impl TransmissionSuccess {
    /// Coerce a decoded 200 body against the success shape
    pub fn coerce(value: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value)
            .map_err(|e| SchemaError::single(SchemaShape::SuccessResponse, e.to_string()))
    }

    pub fn id(&self) -> &str {
        &self.results.id
    }
}

/// 400 reply body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionFailure {
    /// Never empty once coerced
    pub errors: Vec<ApiError>,

    #[serde(flatten)]
    pub extra: JsonObject,
}

/// One entry of a 400 reply's `errors` list
///
/// `message`, `code` and `description` are all required strings; an entry
/// missing any of them does not match the failure shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub description: String,

    pub code: String,

    pub message: String,

    #[serde(flatten)]
    pub extra: JsonObject,
}

impl TransmissionFailure {
    /// Coerce a decoded 400 body against the failure shape
    pub fn coerce(value: Value) -> Result<Self, SchemaError> {
        let failure: TransmissionFailure = serde_json::from_value(value)
            .map_err(|e| SchemaError::single(SchemaShape::FailureResponse, e.to_string()))?;

        if failure.errors.is_empty() {
            return Err(SchemaError::single(
                SchemaShape::FailureResponse,
                "errors: must contain at least one entry",
            ));
        }
        Ok(failure)
    }

    /// Message of the first reported error
    pub fn primary_message(&self) -> &str {
        self.errors
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or("transmission failed")
    }
}
