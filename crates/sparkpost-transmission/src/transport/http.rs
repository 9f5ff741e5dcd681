//! Default HTTP transport
//!
//! Wraps a pooled `reqwest::Client` behind a `governor` rate limiter. Only
//! connection failures are retried: the request never reached the server, so
//! a retry cannot send the same mail twice.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::sleep;

use super::{RawResponse, Transport};
use crate::config::TransportConfig;
use crate::error::{ConfigError, TransportError};
use crate::request::HttpRequest;

/// reqwest-backed [`Transport`] with throttling and connect retries
pub struct HttpTransport {
    client: Client,
    limiter: DefaultDirectRateLimiter,
    config: TransportConfig,
}

impl HttpTransport {
    /// Build the client and rate limiter once; both live as long as the transport
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;

        Ok(Self {
            client,
            limiter: RateLimiter::direct(quota(config)?),
            config: config.clone(),
        })
    }

    async fn throttle(&self) {
        if self.limiter.check().is_err() {
            tracing::trace!(
                requests_per_minute = self.config.requests_per_minute,
                "Rate limit reached, waiting for capacity"
            );
            self.limiter.until_ready().await;
        }
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<RawResponse, reqwest::Error> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut backoff_ms = self.config.initial_backoff_ms;
        let mut attempt = 0;

        loop {
            self.throttle().await;

            match self.send_once(&request).await {
                Ok(response) => {
                    tracing::debug!(
                        status = response.status,
                        attempt = attempt,
                        url = %request.url,
                        "Received transmission response"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_connect() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        attempt = attempt,
                        backoff_ms = backoff_ms,
                        error = %e,
                        "Connection failed, retrying transmission request"
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = next_backoff(backoff_ms, &self.config);
                }
                Err(e) => {
                    tracing::warn!(attempt = attempt, error = %e, "Transmission request failed");
                    return Err(map_error(e, self.config.timeout_ms));
                }
            }
        }
    }
}

/// Throttle quota for the configured rate and burst
pub fn quota(config: &TransportConfig) -> Result<Quota, ConfigError> {
    let rate = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
        ConfigError::InvalidRateLimit("requests_per_minute must be greater than zero".to_string())
    })?;
    let burst = NonZeroU32::new(config.burst)
        .ok_or_else(|| ConfigError::InvalidRateLimit("burst must be greater than zero".to_string()))?;

    Ok(Quota::per_minute(rate).allow_burst(burst))
}

/// `User-Agent` sent with every request
fn user_agent() -> String {
    format!("sparkpost-transmission/{}", crate::CLIENT_VERSION)
}

fn next_backoff(current_ms: u64, config: &TransportConfig) -> u64 {
    let next = (current_ms as f64 * config.backoff_multiplier) as u64;
    next.min(config.max_backoff_ms)
}

fn map_error(error: reqwest::Error, timeout_ms: u64) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout_ms)
    } else {
        TransportError::Network(error.to_string())
    }
}
