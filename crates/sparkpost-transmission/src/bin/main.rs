//! sparkpost-transmit entry point

use clap::Parser;
use sparkpost_transmission::cli::{self, ExitCode, TransmitCli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the JSON result
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = TransmitCli::parse();
    let code = cli::run(cli).await?;

    if code != ExitCode::Success {
        std::process::exit(code.into());
    }
    Ok(())
}
