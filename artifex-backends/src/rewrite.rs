//! Pattern rewrite back-end
//!
//! Applies one compiled regex over the whole input text. The replacement
//! supports capture-group templates (`$1`, `$name`); the documented default
//! is the empty string, which strips every match; the classic use is
//! comment removal.

use artifex_core::{JobConfig, JobKind};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Native regex rewrite pass.
pub struct RegexTransformBackend;

#[async_trait]
impl artifex_engine::Backend for RegexTransformBackend {
    fn kind(&self) -> JobKind {
        JobKind::RegexTransform
    }

    async fn execute(
        &self,
        config: &JobConfig,
        staged: &Path,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let JobConfig::RegexTransform(config) = config else {
            anyhow::bail!("regex back-end received a {} configuration", config.kind());
        };
        // Validation compiled this already; recompiling keeps the back-end
        // self-contained for direct callers.
        let matcher = Regex::new(&config.pattern)?;
        let text = tokio::fs::read_to_string(&config.input).await?;
        let rewritten = matcher.replace_all(&text, config.replacement.as_str());
        debug!(
            pattern = %config.pattern,
            input = %config.input.display(),
            "rewrite pass complete"
        );
        tokio::fs::write(staged, rewritten.as_bytes()).await?;
        Ok(())
    }
}
