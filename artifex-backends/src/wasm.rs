//! WebAssembly lowering back-end
//!
//! Text-format sources (`.wat`/`.wast`) are lowered to binary via
//! `wat2wasm`; an already-binary `.wasm` input passes through unchanged.

use crate::tool::run_tool;
use artifex_core::{JobConfig, JobKind};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Lowers a WebAssembly source to its binary form.
pub struct WasmLowerBackend {
    program: String,
}

impl WasmLowerBackend {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for WasmLowerBackend {
    fn default() -> Self {
        Self::with_program("wat2wasm")
    }
}

#[async_trait]
impl artifex_engine::Backend for WasmLowerBackend {
    fn kind(&self) -> JobKind {
        JobKind::WasmTransform
    }

    async fn execute(
        &self,
        config: &JobConfig,
        staged: &Path,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let JobConfig::WasmTransform(config) = config else {
            anyhow::bail!("wasm back-end received a {} configuration", config.kind());
        };
        match config.input.extension().and_then(|e| e.to_str()) {
            Some("wat" | "wast") => {
                let args: Vec<OsString> = vec![
                    config.input.clone().into(),
                    "-o".into(),
                    staged.to_path_buf().into(),
                ];
                run_tool(&self.program, args, cancel).await
            }
            Some("wasm") => {
                // Already binary; nothing to lower.
                tokio::fs::copy(&config.input, staged).await?;
                Ok(())
            }
            _ => anyhow::bail!(
                "unrecognized wasm source '{}'",
                config.input.display()
            ),
        }
    }
}
