//! Client configuration
//!
//! Defaults are merged at construction; a built [`ClientConfig`] is immutable
//! and owned by the client. Configuration can come from the builder, from
//! `SPARKPOST_*` environment variables, or from a TOML/YAML/JSON file.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Production API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.sparkpost.com/api";

/// Path of the transmissions resource, relative to the endpoint
pub const TRANSMISSIONS_PATH: &str = "/v1/transmissions";

/// Client configuration
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// API key, sent verbatim in the `Authorization` header
    pub api_key: String,

    /// Force `options.sandbox = true` on every transmission
    #[serde(default)]
    pub sandbox: bool,

    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Transport throttle, timeout and retry policy
    #[serde(default)]
    pub http: TransportConfig,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("sandbox", &self.sandbox)
            .field("endpoint", &self.endpoint)
            .field("http", &self.http)
            .finish()
    }
}

/// Transport policy consumed by [`crate::transport::HttpTransport`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Sustained request rate
    pub requests_per_minute: u32,

    /// Requests allowed back to back before throttling starts
    pub burst: u32,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Retries after a failed connection attempt
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    pub max_backoff_ms: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            burst: 2,
            timeout_ms: 30_000,
            max_retries: 2,
            initial_backoff_ms: 250,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl ClientConfig {
    /// Config with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            sandbox: false,
            endpoint: default_endpoint(),
            http: TransportConfig::default(),
        }
    }

    /// Create a new config builder
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }

    /// Create config from `SPARKPOST_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("SPARKPOST_API_KEY")
            .ok_or_else(|| ConfigError::MissingApiKey("SPARKPOST_API_KEY is not set".to_string()))?;

        let defaults = TransportConfig::default();
        let config = Self {
            api_key,
            sandbox: env_value(&lookup, "SPARKPOST_SANDBOX", parse_flag)?.unwrap_or(false),
            endpoint: lookup("SPARKPOST_ENDPOINT").unwrap_or_else(default_endpoint),
            http: TransportConfig {
                requests_per_minute: env_number(&lookup, "SPARKPOST_RATE_PER_MINUTE")?
                    .unwrap_or(defaults.requests_per_minute),
                burst: env_number(&lookup, "SPARKPOST_BURST")?.unwrap_or(defaults.burst),
                timeout_ms: env_number(&lookup, "SPARKPOST_TIMEOUT_MS")?
                    .unwrap_or(defaults.timeout_ms),
                max_retries: env_number(&lookup, "SPARKPOST_MAX_RETRIES")?
                    .unwrap_or(defaults.max_retries),
                ..defaults
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML, YAML or JSON file, chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config: ClientConfig = match extension.as_deref() {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ConfigError::Parse(format!("TOML error: {}", e)))?
            }
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("YAML error: {}", e)))?,
            _ => serde_json::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("JSON error: {}", e)))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the values the client depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey("api_key is empty".to_string()));
        }

        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }

        if self.http.requests_per_minute == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "requests_per_minute must be greater than zero".to_string(),
            ));
        }
        if self.http.burst == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "burst must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Full URL of the transmissions resource
    pub fn transmissions_url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), TRANSMISSIONS_PATH)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// A set but unparseable variable is an error, never a silent default.
fn env_value<F, T>(
    lookup: &F,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| ConfigError::Parse(format!("{}: invalid value '{}'", name, raw))),
    }
}

fn env_number<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    env_value(lookup, name, |raw| raw.trim().parse().ok())
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(api_key),
        }
    }

    /// Enable or disable sandbox mode
    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.config.sandbox = enabled;
        self
    }

    /// Set the API base URL
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Replace the whole transport policy
    pub fn http(mut self, http: TransportConfig) -> Self {
        self.config.http = http;
        self
    }

    /// Set the throttle rate and burst
    pub fn rate_limit(mut self, requests_per_minute: u32, burst: u32) -> Self {
        self.config.http.requests_per_minute = requests_per_minute;
        self.config.http.burst = burst;
        self
    }

    /// Set the request timeout
    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.config.http.timeout_ms = timeout;
        self
    }

    /// Set the maximum retry attempts
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.http.max_retries = retries;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new("key");
        assert!(!config.sandbox);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.http.requests_per_minute, 10);
        assert_eq!(config.http.burst, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::builder("key")
            .sandbox(true)
            .endpoint("http://localhost:9000/api/")
            .rate_limit(60, 5)
            .timeout_ms(1000)
            .max_retries(0)
            .build()
            .unwrap();

        assert!(config.sandbox);
        assert_eq!(config.http.requests_per_minute, 60);
        assert_eq!(config.http.burst, 5);
        assert_eq!(config.http.timeout_ms, 1000);
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(
            config.transmissions_url(),
            "http://localhost:9000/api/v1/transmissions"
        );
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            ClientConfig::builder("  ").build(),
            Err(ConfigError::MissingApiKey(_))
        ));
        assert!(matches!(
            ClientConfig::builder("key").endpoint("not a url").build(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            ClientConfig::builder("key").endpoint("ftp://example.com").build(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            ClientConfig::builder("key").rate_limit(0, 2).build(),
            Err(ConfigError::InvalidRateLimit(_))
        ));
        assert!(matches!(
            ClientConfig::builder("key").rate_limit(10, 0).build(),
            Err(ConfigError::InvalidRateLimit(_))
        ));
    }

    #[test]
    fn test_from_env_with() {
        let vars: HashMap<&str, &str> = [
            ("SPARKPOST_API_KEY", "env-key"),
            ("SPARKPOST_SANDBOX", "TRUE"),
            ("SPARKPOST_ENDPOINT", "https://api.eu.sparkpost.com/api"),
            ("SPARKPOST_BURST", "4"),
        ]
        .into_iter()
        .collect();

        let config =
            ClientConfig::from_env_with(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_key, "env-key");
        assert!(config.sandbox);
        assert_eq!(config.endpoint, "https://api.eu.sparkpost.com/api");
        assert_eq!(config.http.burst, 4);
        assert_eq!(config.http.timeout_ms, 30_000);
        assert_eq!(config.http.requests_per_minute, 10);
    }

    #[test]
    fn test_from_env_rejects_unparseable_values() {
        for (name, value) in [
            ("SPARKPOST_TIMEOUT_MS", "abc"),
            ("SPARKPOST_SANDBOX", "maybe"),
            ("SPARKPOST_RATE_PER_MINUTE", "-5"),
        ] {
            let err = ClientConfig::from_env_with(|var| match var {
                "SPARKPOST_API_KEY" => Some("key".to_string()),
                _ if var == name => Some(value.to_string()),
                _ => None,
            })
            .unwrap_err();

            match err {
                ConfigError::Parse(message) => assert!(message.contains(name)),
                other => panic!("expected parse error for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_from_env_sandbox_false() {
        let config = ClientConfig::from_env_with(|var| match var {
            "SPARKPOST_API_KEY" => Some("key".to_string()),
            "SPARKPOST_SANDBOX" => Some("off".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(!config.sandbox);
    }

    #[test]
    fn test_from_env_requires_api_key() {
        let err = ClientConfig::from_env_with(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(_)));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "api_key = \"file-key\"\nsandbox = true\n\n[http]\nrequests_per_minute = 30"
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_key, "file-key");
        assert!(config.sandbox);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.http.requests_per_minute, 30);
        assert_eq!(config.http.burst, 2);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "api_key: yaml-key\nendpoint: http://localhost:8080").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_key, "yaml-key");
        assert_eq!(config.endpoint, "http://localhost:8080");
    }

    #[test]
    fn test_from_file_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{\"sandbox\": true}}").unwrap();

        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
