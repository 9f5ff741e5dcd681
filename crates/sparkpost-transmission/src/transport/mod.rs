//! Transport collaborator
//!
//! The client hands a built [`HttpRequest`] to a [`Transport`] and applies the
//! classifier to whatever comes back. Throttling, pooling and retries belong
//! to the transport; [`HttpTransport`] is the default implementation.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::HttpRequest;

/// Raw reply as received from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes transport-level requests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the raw reply.
    ///
    /// Any status code is a successful execution; only failures to obtain a
    /// reply are errors.
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}
