//! Build manifest
//!
//! A TOML file describing an ordered pipeline, one `[[stage]]` table per
//! job. The stage tables use the same tagged shapes as the engine, so a
//! manifest is just a pipeline spec at rest:
//!
//! ```toml
//! [[stage]]
//! kind = "typescript-compile"
//! input = "src/app.ts"
//! output = "dist/app.js"
//!
//! [[stage]]
//! kind = "minify"
//! input = "dist/app.js"
//! output = "dist/app.min.js"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use artifex_core::{JobConfig, PipelineSpec};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(rename = "stage")]
    stages: Vec<JobConfig>,

    #[serde(default)]
    cleanup_on_failure: bool,
}

/// Loads and parses a manifest into a pipeline spec.
pub fn load(path: &Path) -> Result<PipelineSpec> {
    let text = std::fs::read_to_string(path)?;
    parse(&text).with_context(|| format!("invalid manifest '{}'", path.display()))
}

fn parse(text: &str) -> Result<PipelineSpec> {
    let manifest: Manifest = toml::from_str(text)?;
    let mut spec = PipelineSpec::new(manifest.stages);
    spec.cleanup_on_failure = manifest.cleanup_on_failure;
    Ok(spec)
}
