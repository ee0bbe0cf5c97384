//! Kiln console
//!
//! Command-line console for an ML pipeline backend: dataset validation,
//! model builds and inference, with live status while jobs run.

mod commands;
mod config;
mod notify;
mod render;
mod scheduler;
mod store;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Kiln ML pipeline console", long_about = None)]
struct Cli {
    /// Backend API base URL
    #[arg(
        long,
        env = "KILN_API_BASE_URL",
        default_value = "http://localhost:8000"
    )]
    api_base_url: String,

    /// Milliseconds between status polls while jobs are in flight
    #[arg(long, env = "KILN_POLL_INTERVAL_MS", default_value_t = 500)]
    poll_interval_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "KILN_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging on stderr; stdout carries tables and JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiln=warn,kiln_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::new(cli.api_base_url);
    config.poll_interval = Duration::from_millis(cli.poll_interval_ms);
    config.request_timeout = Duration::from_secs(cli.timeout_secs);
    config.validate()?;
    debug!("Loaded configuration: {:?}", config);

    handle_command(cli.command, &config).await
}
