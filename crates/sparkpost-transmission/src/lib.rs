//! SparkPost Transmission Client
//!
//! Submits transmissions (bulk email sends) to the SparkPost API and
//! classifies each reply into exactly one validated outcome.
//!
//! ## Architecture
//!
//! 1. **Contracts** (`contracts/`): request and reply shapes, including the
//!    per-value discrimination of recipients and content.
//!
//! 2. **Request** (`request`): builds the POST descriptor, applying the
//!    sandbox override to a copy of the payload.
//!
//! 3. **Classify** (`classify`): pure `(status, body)` to outcome mapping.
//!
//! 4. **Client** (`client`): validates, builds, dispatches and hands back a
//!    one-shot [`TransmissionHandle`].
//!
//! 5. **Transport** (`transport`): the HTTP collaborator, throttled with a
//!    `governor` rate limiter.
//!
//! 6. **Telemetry** (`telemetry`): Prometheus counters for outcomes.
//!
//! ## Outcomes
//!
//! A handle resolves to `Ok(TransmissionSuccess)` or to one of:
//! - [`TransmissionError::Schema`]: malformed payload or reply
//! - [`TransmissionError::Failed`]: the API rejected the send (HTTP 400)
//! - [`TransmissionError::Transport`]: network failures and other statuses

pub mod classify;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod telemetry;
pub mod transport;

#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use classify::classify;
pub use client::{TransmissionClient, TransmissionHandle};
pub use config::{ClientConfig, ClientConfigBuilder, TransportConfig, DEFAULT_ENDPOINT};
pub use contracts::{
    Address, ApiError, Content, InlineContent, InlineRecipient, JsonObject, ListReference,
    Recipient, TemplateReference, Transmission, TransmissionBuilder, TransmissionFailure,
    TransmissionOptions, TransmissionResults, TransmissionSuccess,
};
pub use error::{
    ConfigError, SchemaError, SchemaShape, TransmissionError, TransmissionFailed, TransportError,
};
pub use request::{build_request, HttpRequest};
pub use telemetry::TransmissionMetrics;
pub use transport::{HttpTransport, RawResponse, Transport};

/// Client version (from Cargo.toml)
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
