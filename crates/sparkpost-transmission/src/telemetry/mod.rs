//! Telemetry for the transmission client
//!
//! Structured logging goes through `tracing` at the call sites; this module
//! holds the Prometheus side:
//!
//! - `metrics` - transmission outcome counters and latency histogram

pub mod metrics;

pub use metrics::{Outcome, TransmissionMetrics};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
