//! CLI module for the transmission client
//!
//! `send` submits a payload file through [`TransmissionClient`]; `validate`
//! runs the same coercion offline. Exit codes distinguish the error kinds so
//! scripts can branch on them.

pub mod commands;

pub use commands::{TransmitCli, TransmitCommands};

use std::path::Path;
use thiserror::Error;

use crate::client::TransmissionClient;
use crate::config::ClientConfig;
use crate::contracts::Transmission;
use crate::error::{SchemaError, TransmissionError};

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Transmission accepted or payload valid
    Success = 0,
    /// The API rejected the transmission
    TransmissionFailed = 1,
    /// Payload or reply did not match its schema
    SchemaError = 3,
    /// Payload or config file missing or unreadable
    FileError = 4,
    /// Transport failure
    TransportError = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_error(error: &TransmissionError) -> Self {
        match error {
            TransmissionError::Schema(_) => ExitCode::SchemaError,
            TransmissionError::Failed(_) => ExitCode::TransmissionFailed,
            TransmissionError::Transport(_) => ExitCode::TransportError,
        }
    }
}

/// Errors while loading a payload file
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl PayloadError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            PayloadError::Io(_) => ExitCode::FileError,
            PayloadError::Parse(_) | PayloadError::Schema(_) => ExitCode::SchemaError,
        }
    }
}

/// Load and coerce a payload file; YAML by extension, JSON otherwise
pub fn load_payload(path: &Path) -> Result<Transmission, PayloadError> {
    let content = std::fs::read_to_string(path)?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let value: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| PayloadError::Parse(format!("YAML error: {}", e)))?
    } else {
        serde_json::from_str(&content).map_err(|e| PayloadError::Parse(format!("JSON error: {}", e)))?
    };

    Ok(Transmission::coerce(value)?)
}

/// Run the CLI and return the exit code
pub async fn run(cli: TransmitCli) -> anyhow::Result<ExitCode> {
    match cli.command {
        TransmitCommands::Validate { payload } => match load_payload(&payload) {
            Ok(transmission) => {
                println!("{}", serde_json::to_string_pretty(&transmission)?);
                Ok(ExitCode::Success)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                Ok(e.exit_code())
            }
        },

        TransmitCommands::Send {
            payload,
            config,
            sandbox,
        } => {
            let loaded = match config {
                Some(path) => ClientConfig::from_file(path),
                None => ClientConfig::from_env(),
            };
            let mut client_config = match loaded {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(ExitCode::FileError);
                }
            };
            client_config.sandbox |= sandbox;

            let transmission = match load_payload(&payload) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(e.exit_code());
                }
            };

            let client = TransmissionClient::new(client_config)?;
            match client.send(&transmission).await {
                Ok(success) => {
                    println!("{}", serde_json::to_string_pretty(&success)?);
                    Ok(ExitCode::Success)
                }
                Err(e) => {
                    if let TransmissionError::Failed(failed) = &e {
                        eprintln!("{}", serde_json::to_string_pretty(&failed.failure)?);
                    }
                    eprintln!("Error: {}", e);
                    Ok(ExitCode::from_error(&e))
                }
            }
        }
    }
}
