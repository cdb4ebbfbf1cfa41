//! Kind listing command

use anyhow::Result;
use colored::*;
use std::sync::Arc;

use artifex_engine::Orchestrator;

pub fn handle_kinds(orchestrator: &Arc<Orchestrator>) -> Result<()> {
    let mut kinds = orchestrator.registry().kinds();
    kinds.sort_by_key(|kind| kind.to_string());

    println!("{}", format!("{} registered kind(s):", kinds.len()).bold());
    for kind in kinds {
        println!("  {}", kind.to_string().cyan());
    }
    Ok(())
}
