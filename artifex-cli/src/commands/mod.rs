//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod build;
mod kinds;
mod run;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;

use artifex_engine::Orchestrator;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a single transformation job
    Run(run::RunArgs),
    /// Run the pipeline described by a TOML manifest
    Build {
        /// Path to the manifest
        #[arg(default_value = "artifex.toml")]
        manifest: PathBuf,

        /// Remove intermediate outputs if a later stage fails
        #[arg(long)]
        cleanup_on_failure: bool,
    },
    /// List the registered transformation kinds
    Kinds,
}

/// Routes a command to its handler.
pub async fn handle_command(command: Commands, orchestrator: &Arc<Orchestrator>) -> Result<()> {
    match command {
        Commands::Run(args) => run::handle_run(args, orchestrator).await,
        Commands::Build {
            manifest,
            cleanup_on_failure,
        } => build::handle_build(&manifest, cleanup_on_failure, orchestrator).await,
        Commands::Kinds => kinds::handle_kinds(orchestrator),
    }
}
