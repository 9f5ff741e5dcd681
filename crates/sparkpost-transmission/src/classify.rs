//! Response classifier
//!
//! A pure function of `(status, body)`:
//! - 200: coerce against [`TransmissionSuccess`]
//! - 400: coerce against [`TransmissionFailure`], then report it as
//!   [`TransmissionFailed`]
//! - anything else: [`TransportError::UnexpectedStatus`] carrying the body
//!
//! A 200/400 body that does not coerce is a [`SchemaError`], never a
//! pass-through.

use serde_json::Value;

use crate::contracts::{TransmissionFailure, TransmissionSuccess};
use crate::error::{SchemaError, SchemaShape, TransmissionError, TransmissionFailed, TransportError};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Classify a raw reply into a validated outcome
pub fn classify(status: u16, body: &[u8]) -> Result<TransmissionSuccess, TransmissionError> {
    match status {
        STATUS_OK => {
            let value = decode(body, SchemaShape::SuccessResponse)?;
            Ok(TransmissionSuccess::coerce(value)?)
        }
        STATUS_BAD_REQUEST => {
            let value = decode(body, SchemaShape::FailureResponse)?;
            let failure = TransmissionFailure::coerce(value)?;
            Err(TransmissionFailed::new(failure).into())
        }
        other => Err(TransportError::UnexpectedStatus {
            status: other,
            body: String::from_utf8_lossy(body).into_owned(),
        }
        .into()),
    }
}

fn decode(body: &[u8], shape: SchemaShape) -> Result<Value, SchemaError> {
    serde_json::from_slice(body).map_err(|e| SchemaError::single(shape, format!("invalid JSON: {}", e)))
}
