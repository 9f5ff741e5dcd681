//! Transmission client
//!
//! Owns the configuration and the transport, and exposes the single
//! `transmission` operation. Each call validates and builds synchronously,
//! then hands the request to a spawned task; the caller receives a
//! [`TransmissionHandle`] that resolves exactly once.
//!
//! # Example
//!
//! ```rust,no_run
//! use sparkpost_transmission::{
//!     ClientConfig, InlineContent, InlineRecipient, Transmission, TransmissionClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TransmissionClient::new(ClientConfig::from_env()?)?;
//!
//!     let payload = Transmission::builder()
//!         .recipient(InlineRecipient::new("jane@example.com"))
//!         .content(InlineContent::new("Hello", "news@example.com").with_text("Hi Jane"))
//!         .build()?;
//!
//!     let success = client.transmission(&payload).await?;
//!     println!("queued as {}", success.id());
//!     Ok(())
//! }
//! ```

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::Instrument;
use uuid::Uuid;

use crate::classify::classify;
use crate::config::ClientConfig;
use crate::contracts::{Transmission, TransmissionSuccess};
use crate::error::{ConfigError, Result, TransmissionError, TransportError};
use crate::request::build_request;
use crate::telemetry::TransmissionMetrics;
use crate::transport::{HttpTransport, Transport};

/// Client for the transmissions endpoint
#[derive(Clone)]
pub struct TransmissionClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    metrics: Option<Arc<TransmissionMetrics>>,
}

impl TransmissionClient {
    /// Validate the config and acquire the default HTTP transport
    pub fn new(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let transport = HttpTransport::new(&config.http)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Use an injected transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            metrics: None,
        }
    }

    /// Record outcomes on the given metrics
    pub fn with_metrics(mut self, metrics: Arc<TransmissionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit a transmission.
    ///
    /// A payload that fails validation resolves the handle immediately with a
    /// schema error and nothing is sent. Must be called from within a Tokio
    /// runtime; otherwise the handle resolves to [`TransportError::Runtime`].
    pub fn transmission(&self, payload: &Transmission) -> TransmissionHandle {
        let request_id = Uuid::new_v4();

        let request = match payload
            .validate()
            .and_then(|_| build_request(&self.config, payload))
        {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    diagnostics = ?e.diagnostics,
                    "Rejected transmission payload before dispatch"
                );
                return self.resolved(request_id, Err(e.into()));
            }
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                return self.resolved(request_id, Err(TransportError::Runtime(e.to_string()).into()))
            }
        };

        tracing::debug!(
            request_id = %request_id,
            recipients = payload.recipients.len(),
            sandbox = self.config.sandbox,
            "Dispatching transmission"
        );

        let (sender, receiver) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let metrics = self.metrics.clone();
        let span = tracing::info_span!("transmission", request_id = %request_id);

        runtime.spawn(
            async move {
                let started = Instant::now();
                let result = match transport.execute(request).await {
                    Ok(response) => classify(response.status, &response.body),
                    Err(e) => Err(e.into()),
                };
                let elapsed = started.elapsed();

                match &result {
                    Ok(success) => tracing::info!(
                        transmission_id = %success.results.id,
                        accepted = success.results.total_accepted_recipients,
                        rejected = success.results.total_rejected_recipients,
                        duration_ms = elapsed.as_millis() as u64,
                        "Transmission accepted"
                    ),
                    Err(e) => tracing::warn!(
                        kind = e.kind(),
                        error = %e,
                        duration_ms = elapsed.as_millis() as u64,
                        "Transmission did not succeed"
                    ),
                }

                if let Some(metrics) = metrics {
                    metrics.observe_duration(elapsed.as_secs_f64());
                    metrics.record_result(&result);
                }

                // The caller may have dropped the handle; the outcome is logged either way.
                let _ = sender.send(result);
            }
            .instrument(span),
        );

        TransmissionHandle {
            request_id,
            receiver,
        }
    }

    /// Coerce loosely typed JSON into a transmission, then submit it
    pub fn transmission_value(&self, payload: Value) -> TransmissionHandle {
        match Transmission::coerce(payload) {
            Ok(transmission) => self.transmission(&transmission),
            Err(e) => {
                let request_id = Uuid::new_v4();
                tracing::warn!(
                    request_id = %request_id,
                    diagnostics = ?e.diagnostics,
                    "Rejected transmission payload before dispatch"
                );
                self.resolved(request_id, Err(e.into()))
            }
        }
    }

    /// Submit a transmission and wait for its outcome
    pub async fn send(&self, payload: &Transmission) -> Result<TransmissionSuccess> {
        self.transmission(payload).await
    }

    fn resolved(
        &self,
        request_id: Uuid,
        result: Result<TransmissionSuccess>,
    ) -> TransmissionHandle {
        if let Some(metrics) = &self.metrics {
            metrics.record_result(&result);
        }
        TransmissionHandle::ready(request_id, result)
    }
}

/// One-shot handle carrying the single outcome of a transmission
#[derive(Debug)]
pub struct TransmissionHandle {
    request_id: Uuid,
    receiver: oneshot::Receiver<Result<TransmissionSuccess>>,
}

impl TransmissionHandle {
    fn ready(request_id: Uuid, result: Result<TransmissionSuccess>) -> Self {
        let (sender, receiver) = oneshot::channel();
        // The receiver is held right here, so the send cannot fail.
        let _ = sender.send(result);
        Self {
            request_id,
            receiver,
        }
    }

    /// Correlation id used in this transmission's log events
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Block the current thread until the outcome arrives.
    ///
    /// Panics if called from within an async context, like
    /// [`oneshot::Receiver::blocking_recv`].
    pub fn wait(self) -> Result<TransmissionSuccess> {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(TransportError::ChannelClosed.into()))
    }
}

impl Future for TransmissionHandle {
    type Output = Result<TransmissionSuccess>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(TransmissionError::Transport(TransportError::ChannelClosed)))
        })
    }
}
