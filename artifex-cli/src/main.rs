//! Artifex CLI
//!
//! Command-line interface for the Artifex transformation orchestrator.
//! Owns process setup: logging, registry population with the built-in
//! back-ends, and a clean façade shutdown after each command.

mod commands;
mod manifest;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, handle_command};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artifex_backends::register_builtin;
use artifex_engine::{CapabilityRegistry, Orchestrator};

#[derive(Parser)]
#[command(name = "artifex")]
#[command(about = "Artifex code-transformation orchestrator", long_about = None)]
struct Cli {
    /// Per-job deadline in seconds
    #[arg(long, env = "ARTIFEX_JOB_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artifex=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut registry = CapabilityRegistry::new();
    register_builtin(&mut registry).context("failed to register built-in back-ends")?;
    let orchestrator = Arc::new(
        Orchestrator::new(registry).with_deadline(Duration::from_secs(cli.timeout)),
    );

    let result = handle_command(cli.command, &orchestrator).await;

    // Drain anything still in flight before the process exits.
    orchestrator.shutdown(Duration::from_secs(5)).await;

    result
}
