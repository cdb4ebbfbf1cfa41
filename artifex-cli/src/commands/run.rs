//! Single-job command
//!
//! Builds a kind-specific configuration from flags, submits it, and prints
//! the outcome. Ctrl-C while the job runs turns into a cooperative cancel
//! through the façade.

use anyhow::{Result, bail};
use clap::Args;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use artifex_core::{
    BundleConfig, CompileConfig, JobConfig, JobKind, MinifyConfig, RegexConfig, WasmConfig,
};
use artifex_engine::Orchestrator;

#[derive(Args)]
pub struct RunArgs {
    /// Transformation kind (typescript-compile, regex-transform, minify,
    /// bundle, wasm-transform)
    pub kind: String,

    /// Input file; repeat for bundle inputs (order sets precedence)
    #[arg(short, long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Regex pattern (regex-transform only)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Replacement template; defaults to stripping each match
    #[arg(long)]
    pub replacement: Option<String>,
}

pub async fn handle_run(args: RunArgs, orchestrator: &Arc<Orchestrator>) -> Result<()> {
    let config = job_config(args)?;
    let kind = config.kind();

    let handle = orchestrator.spawn_job(config);
    let id = handle.id();

    let result = tokio::select! {
        result = handle.wait() => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{}", "interrupt received, cancelling...".yellow());
            orchestrator.cancel(id);
            Err(artifex_core::EngineError::Cancelled { kind })
        }
    };

    match result {
        Ok(outcome) => {
            println!(
                "{} {} -> {}",
                "ok".green().bold(),
                outcome.kind,
                outcome.output.display()
            );
            Ok(())
        }
        Err(err) => {
            println!("{} {}", "failed".red().bold(), err);
            Err(err.into())
        }
    }
}

/// Assembles the kind-specific configuration, rejecting flag combinations
/// that do not fit the kind.
fn job_config(args: RunArgs) -> Result<JobConfig> {
    let kind = parse_kind(&args.kind)?;

    if kind != JobKind::Bundle && args.inputs.len() != 1 {
        bail!("'{kind}' takes exactly one --input");
    }
    if kind != JobKind::RegexTransform && args.pattern.is_some() {
        bail!("--pattern only applies to regex-transform");
    }

    let config = match kind {
        JobKind::TypeScriptCompile => JobConfig::TypeScriptCompile(CompileConfig {
            input: args.inputs.into_iter().next().unwrap_or_default(),
            output: args.output,
        }),
        JobKind::RegexTransform => {
            let Some(pattern) = args.pattern else {
                bail!("regex-transform requires --pattern");
            };
            JobConfig::RegexTransform(RegexConfig {
                pattern,
                replacement: args.replacement.unwrap_or_default(),
                input: args.inputs.into_iter().next().unwrap_or_default(),
                output: args.output,
            })
        }
        JobKind::Minify => JobConfig::Minify(MinifyConfig {
            input: args.inputs.into_iter().next().unwrap_or_default(),
            output: args.output,
        }),
        JobKind::Bundle => JobConfig::Bundle(BundleConfig {
            inputs: args.inputs,
            output: args.output,
        }),
        JobKind::WasmTransform => JobConfig::WasmTransform(WasmConfig {
            input: args.inputs.into_iter().next().unwrap_or_default(),
            output: args.output,
        }),
    };
    Ok(config)
}

fn parse_kind(raw: &str) -> Result<JobKind> {
    for kind in JobKind::ALL {
        if kind.to_string() == raw {
            return Ok(kind);
        }
    }
    bail!(
        "unknown kind '{raw}'; expected one of: {}",
        JobKind::ALL.map(|k| k.to_string()).join(", ")
    )
}
