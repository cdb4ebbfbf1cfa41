//! TypeScript compilation back-end
//!
//! Delegates to the TypeScript compiler binary. The orchestrator neither
//! knows nor cares that `tsc` type-checks; it only sees the staged artifact
//! or a diagnostic.

use crate::tool::run_tool;
use artifex_core::{JobConfig, JobKind};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Compiles one TypeScript file to JavaScript via `tsc`.
pub struct TypeScriptCompileBackend {
    program: String,
}

impl TypeScriptCompileBackend {
    /// Uses an alternative compiler binary (e.g. a pinned toolchain path).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for TypeScriptCompileBackend {
    fn default() -> Self {
        Self::with_program("tsc")
    }
}

#[async_trait]
impl artifex_engine::Backend for TypeScriptCompileBackend {
    fn kind(&self) -> JobKind {
        JobKind::TypeScriptCompile
    }

    async fn execute(
        &self,
        config: &JobConfig,
        staged: &Path,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let JobConfig::TypeScriptCompile(config) = config else {
            anyhow::bail!("typescript back-end received a {} configuration", config.kind());
        };
        let args: Vec<OsString> = vec![
            config.input.clone().into(),
            "--outFile".into(),
            staged.to_path_buf().into(),
        ];
        run_tool(&self.program, args, cancel).await
    }
}
