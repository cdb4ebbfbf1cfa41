//! Minification back-end
//!
//! Delegates to `terser` with compress and mangle enabled, mirroring the
//! usual production defaults.

use crate::tool::run_tool;
use artifex_core::{JobConfig, JobKind};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Minifies one JavaScript file via `terser`.
pub struct MinifyBackend {
    program: String,
}

impl MinifyBackend {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MinifyBackend {
    fn default() -> Self {
        Self::with_program("terser")
    }
}

#[async_trait]
impl artifex_engine::Backend for MinifyBackend {
    fn kind(&self) -> JobKind {
        JobKind::Minify
    }

    async fn execute(
        &self,
        config: &JobConfig,
        staged: &Path,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let JobConfig::Minify(config) = config else {
            anyhow::bail!("minify back-end received a {} configuration", config.kind());
        };
        let args: Vec<OsString> = vec![
            config.input.clone().into(),
            "--compress".into(),
            "--mangle".into(),
            "--output".into(),
            staged.to_path_buf().into(),
        ];
        run_tool(&self.program, args, cancel).await
    }
}
