//! Pipeline composer
//!
//! Executes an ordered chain of jobs as one logical transaction. Wiring is
//! checked structurally before anything runs; stages then execute strictly
//! sequentially because each stage's input is its predecessor's output
//! artifact. The first failure stops the chain and is reported with its
//! 0-based stage index; successor outputs are never created.
//!
//! Completed upstream intermediates are left on disk by default, since they are
//! valid artifacts in their own right, unless cleanup-on-failure is set.

use crate::executor::Executor;
use crate::registry::CapabilityRegistry;
use crate::validate::validate;
use artifex_core::{EngineError, JobConfig, JobDescriptor, JobOutcome, PipelineSpec, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs pipelines against a shared registry and executor.
pub struct PipelineComposer<'a> {
    registry: &'a CapabilityRegistry,
    executor: &'a Executor,
}

impl<'a> PipelineComposer<'a> {
    pub fn new(registry: &'a CapabilityRegistry, executor: &'a Executor) -> Self {
        Self { registry, executor }
    }

    /// Executes every stage in order and returns the final stage's outcome.
    ///
    /// The deadline applies per stage, not to the pipeline as a whole, so a
    /// slow first stage cannot starve a fast second stage's budget. The
    /// cancellation token governs the whole chain.
    pub async fn run(
        &self,
        spec: &PipelineSpec,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome> {
        if spec.is_empty() {
            return Err(EngineError::EmptyPipeline);
        }
        check_wiring(&spec.stages)?;

        info!(stages = spec.len(), "pipeline started");

        let mut published: Vec<JobOutcome> = Vec::with_capacity(spec.len());
        for (index, config) in spec.stages.iter().enumerate() {
            let kind = config.kind();
            info!(stage = index, total = spec.len(), %kind, "stage started");

            // Stage inputs may only exist once the predecessor published,
            // so full validation happens here rather than upfront.
            let outcome = self
                .run_stage(config.clone(), cancel)
                .await
                .map_err(|source| EngineError::Stage {
                    index,
                    kind,
                    source: Box::new(source),
                });

            match outcome {
                Ok(outcome) => {
                    info!(stage = index, %kind, output = %outcome.output.display(), "stage finished");
                    published.push(outcome);
                }
                Err(err) => {
                    if spec.cleanup_on_failure {
                        cleanup(&published).await;
                    }
                    return Err(err);
                }
            }
        }

        // Non-empty by the guard above.
        let last = published.pop().ok_or(EngineError::EmptyPipeline)?;
        info!(output = %last.output.display(), "pipeline finished");
        Ok(last)
    }

    async fn run_stage(
        &self,
        config: JobConfig,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome> {
        let backend = self.registry.resolve(config.kind())?;
        let valid = validate(self.registry, JobDescriptor::new(config))?;
        self.executor.run(&valid, backend, cancel).await
    }
}

/// Structural wiring check: stage n's declared output must be consumed by
/// stage n+1. Raised before any back-end runs.
fn check_wiring(stages: &[JobConfig]) -> Result<()> {
    for (index, pair) in stages.windows(2).enumerate() {
        let produced = pair[0].output();
        if !pair[1].consumes(produced) {
            return Err(EngineError::PipelineWiring {
                index: index + 1,
                expected: produced.to_path_buf(),
                found: pair[1].primary_input().to_path_buf(),
            });
        }
    }
    Ok(())
}

async fn cleanup(published: &[JobOutcome]) {
    for outcome in published {
        match tokio::fs::remove_file(&outcome.output).await {
            Ok(()) => info!(output = %outcome.output.display(), "removed intermediate output"),
            Err(e) => warn!(output = %outcome.output.display(), error = %e, "failed to remove intermediate output"),
        }
    }
}
