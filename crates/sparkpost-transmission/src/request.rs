//! Request builder
//!
//! Turns a config and a conforming payload into an [`HttpRequest`] for the
//! transport. No I/O happens here.

use reqwest::Method;
use std::borrow::Cow;
use std::fmt;

use crate::config::ClientConfig;
use crate::contracts::{Transmission, TransmissionOptions};
use crate::error::{SchemaError, SchemaShape};

/// `Content-Type` sent with every transmission
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Transport-level request descriptor
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// First header value with the given name, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case("authorization") {
                    (key.as_str(), "<redacted>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Build the POST descriptor for a transmission.
///
/// In sandbox mode the payload is cloned and `options.sandbox` forced to
/// `true` on the clone; the caller's value is left untouched.
pub fn build_request(
    config: &ClientConfig,
    payload: &Transmission,
) -> Result<HttpRequest, SchemaError> {
    let payload = apply_sandbox(config, payload);

    let body = serde_json::to_vec(payload.as_ref())
        .map_err(|e| SchemaError::single(SchemaShape::Request, e.to_string()))?;

    Ok(HttpRequest {
        method: Method::POST,
        url: config.transmissions_url(),
        headers: vec![
            ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
            ("Authorization".to_string(), config.api_key.clone()),
        ],
        body,
    })
}

/// Payload as it will be sent, with the sandbox override applied
pub fn apply_sandbox<'a>(config: &ClientConfig, payload: &'a Transmission) -> Cow<'a, Transmission> {
    if !config.sandbox {
        return Cow::Borrowed(payload);
    }

    let mut payload = payload.clone();
    payload
        .options
        .get_or_insert_with(TransmissionOptions::default)
        .sandbox = Some(true);
    Cow::Owned(payload)
}
