//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sparkpost-transmit")]
#[command(about = "Submit and validate SparkPost transmissions")]
#[command(version)]
pub struct TransmitCli {
    #[command(subcommand)]
    pub command: TransmitCommands,
}

#[derive(Subcommand, Debug)]
pub enum TransmitCommands {
    /// Send a transmission and print the API's success response
    Send {
        /// Path to the transmission payload (JSON/YAML)
        #[arg(short, long)]
        payload: PathBuf,

        /// Path to a client config file (TOML/YAML/JSON); defaults to SPARKPOST_* variables
        #[arg(short, long, env = "SPARKPOST_CONFIG")]
        config: Option<PathBuf>,

        /// Force sandbox mode regardless of configuration
        #[arg(long)]
        sandbox: bool,
    },

    /// Validate a transmission payload offline and print its normalised form
    Validate {
        /// Path to the transmission payload (JSON/YAML)
        #[arg(short, long)]
        payload: PathBuf,
    },
}
