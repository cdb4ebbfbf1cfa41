//! Manifest-driven pipeline command

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::sync::Arc;

use crate::manifest;
use artifex_core::EngineError;
use artifex_engine::Orchestrator;

pub async fn handle_build(
    path: &Path,
    cleanup_on_failure: bool,
    orchestrator: &Arc<Orchestrator>,
) -> Result<()> {
    let mut spec = manifest::load(path)
        .with_context(|| format!("failed to load manifest '{}'", path.display()))?;
    if cleanup_on_failure {
        spec = spec.with_cleanup_on_failure();
    }

    println!(
        "{}",
        format!("Running {} stage(s) from {}", spec.len(), path.display()).bold()
    );

    match orchestrator.submit_pipeline(spec).await {
        Ok(outcome) => {
            println!(
                "{} pipeline finished -> {}",
                "ok".green().bold(),
                outcome.output.display()
            );
            Ok(())
        }
        Err(err) => {
            match &err {
                EngineError::Stage { index, kind, .. } => {
                    println!(
                        "{} stage {} ({}) failed: {}",
                        "failed".red().bold(),
                        index,
                        kind,
                        err
                    );
                }
                other => println!("{} {}", "failed".red().bold(), other),
            }
            Err(err.into())
        }
    }
}
