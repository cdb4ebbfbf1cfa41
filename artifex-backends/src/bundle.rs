//! Bundle back-end
//!
//! Concatenates the inputs in declared order (order defines resolution
//! precedence), separated by a provenance comment per module. Dependency
//! pruning and graph resolution stay inside whatever replaces this
//! back-end; the engine contract only needs one published artifact.

use artifex_core::{JobConfig, JobKind};
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Ordered-concatenation bundler.
pub struct BundleBackend;

#[async_trait]
impl artifex_engine::Backend for BundleBackend {
    fn kind(&self) -> JobKind {
        JobKind::Bundle
    }

    async fn execute(
        &self,
        config: &JobConfig,
        staged: &Path,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()> {
        let JobConfig::Bundle(config) = config else {
            anyhow::bail!("bundle back-end received a {} configuration", config.kind());
        };
        let mut bundle = String::new();
        for input in &config.inputs {
            if cancel.is_cancelled() {
                anyhow::bail!("bundle interrupted by cancellation");
            }
            let text = tokio::fs::read_to_string(input).await?;
            bundle.push_str(&format!("// module: {}\n", input.display()));
            bundle.push_str(&text);
            if !text.ends_with('\n') {
                bundle.push('\n');
            }
        }
        tokio::fs::write(staged, bundle).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifex_core::BundleConfig;
    use artifex_engine::Backend;

    #[tokio::test]
    async fn test_inputs_concatenated_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("b.js");
        std::fs::write(&a, "const a = 1;\n").unwrap();
        std::fs::write(&b, "const b = 2;").unwrap();
        let staged = dir.path().join("staged.js");

        let config = JobConfig::Bundle(BundleConfig {
            inputs: vec![a.clone(), b.clone()],
            output: dir.path().join("out.js"),
        });
        BundleBackend
            .execute(&config, &staged, &CancellationToken::new())
            .await
            .unwrap();

        let bundled = std::fs::read_to_string(&staged).unwrap();
        let pos_a = bundled.find("const a = 1;").unwrap();
        let pos_b = bundled.find("const b = 2;").unwrap();
        assert!(pos_a < pos_b);
        // Every module gets a provenance header and a trailing newline.
        assert_eq!(bundled.matches("// module:").count(), 2);
        assert!(bundled.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_missing_input_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let config = JobConfig::Bundle(BundleConfig {
            inputs: vec![dir.path().join("absent.js")],
            output: dir.path().join("out.js"),
        });
        let err = BundleBackend
            .execute(
                &config,
                &dir.path().join("staged.js"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }
}
