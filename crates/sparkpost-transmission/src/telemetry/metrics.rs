//! Prometheus metrics for transmissions
//!
//! - `sparkpost_transmissions_total` (counter) - transmissions by outcome
//! - `sparkpost_transmission_duration_seconds` (histogram) - time from dispatch to classification
//! - `sparkpost_recipients_accepted_total` / `sparkpost_recipients_rejected_total` (counters)
//!
//! # Example
//!
//! ```rust,no_run
//! use sparkpost_transmission::telemetry::{Outcome, TransmissionMetrics};
//!
//! let metrics = TransmissionMetrics::new().unwrap();
//! metrics.record_outcome(Outcome::Accepted);
//! println!("{}", metrics.encode_text().unwrap());
//! ```

use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

use super::{Result, TelemetryError};
use crate::contracts::TransmissionSuccess;
use crate::error::TransmissionError;

const NAMESPACE: &str = "sparkpost";

/// Terminal outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Failed,
    SchemaError,
    TransportError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Failed => "failed",
            Outcome::SchemaError => "schema_error",
            Outcome::TransportError => "transport_error",
        }
    }

    pub fn of(result: &std::result::Result<TransmissionSuccess, TransmissionError>) -> Self {
        match result {
            Ok(_) => Outcome::Accepted,
            Err(TransmissionError::Failed(_)) => Outcome::Failed,
            Err(TransmissionError::Schema(_)) => Outcome::SchemaError,
            Err(TransmissionError::Transport(_)) => Outcome::TransportError,
        }
    }
}

/// Transmission metrics registered on a Prometheus registry
pub struct TransmissionMetrics {
    registry: Arc<Registry>,

    /// Transmissions by outcome
    transmissions_total: CounterVec,

    /// Dispatch-to-classification latency
    duration_seconds: Histogram,

    recipients_accepted_total: Counter,

    recipients_rejected_total: Counter,
}

impl TransmissionMetrics {
    /// Create metrics on a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create metrics and register them with the provided registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let transmissions_total = CounterVec::new(
            Opts::new("transmissions_total", "Total number of transmissions by outcome")
                .namespace(NAMESPACE),
            &["outcome"],
        )?;

        let duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "transmission_duration_seconds",
                "Time from dispatch to classified response in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        let recipients_accepted_total = Counter::with_opts(
            Opts::new(
                "recipients_accepted_total",
                "Recipients accepted across all transmissions",
            )
            .namespace(NAMESPACE),
        )?;

        let recipients_rejected_total = Counter::with_opts(
            Opts::new(
                "recipients_rejected_total",
                "Recipients rejected across all transmissions",
            )
            .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(transmissions_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(recipients_accepted_total.clone()))?;
        registry.register(Box::new(recipients_rejected_total.clone()))?;

        Ok(Self {
            registry,
            transmissions_total,
            duration_seconds,
            recipients_accepted_total,
            recipients_rejected_total,
        })
    }

    pub fn record_outcome(&self, outcome: Outcome) {
        self.transmissions_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    pub fn observe_duration(&self, seconds: f64) {
        self.duration_seconds.observe(seconds);
    }

    /// Record a classified result, including recipient counts on success
    pub fn record_result(
        &self,
        result: &std::result::Result<TransmissionSuccess, TransmissionError>,
    ) {
        self.record_outcome(Outcome::of(result));
        if let Ok(success) = result {
            self.recipients_accepted_total
                .inc_by(success.results.total_accepted_recipients as f64);
            self.recipients_rejected_total
                .inc_by(success.results.total_rejected_recipients as f64);
        }
    }

    pub fn transmissions(&self, outcome: Outcome) -> u64 {
        self.transmissions_total
            .with_label_values(&[outcome.as_str()])
            .get() as u64
    }

    /// Render the registry in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingError(e.to_string()))
    }
}
