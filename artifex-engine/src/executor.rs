//! Job executor
//!
//! Runs exactly one validated descriptor to completion. The executor owns
//! the atomicity contract: back-ends write to a staged sibling of the
//! declared output, which is renamed into place only on success and removed
//! on any failure. Renaming within one directory keeps the publish atomic
//! on the same filesystem.
//!
//! Execution is at-most-once; retries belong to the caller and require a
//! fresh descriptor with a fresh id.

use crate::backend::Backend;
use crate::validate::ValidDescriptor;
use artifex_core::{EngineError, JobOutcome, JobStatus, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default per-job deadline.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

/// Executes validated jobs against resolved back-ends.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    deadline: Duration,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Overrides the default deadline for every job this executor runs.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Runs one validated job and publishes its output atomically.
    ///
    /// On timeout the in-flight back-end call is cancelled cooperatively;
    /// whether or not the back-end honors the signal, the staged output is
    /// discarded before the failure is reported.
    pub async fn run(
        &self,
        valid: &ValidDescriptor,
        backend: Arc<dyn Backend>,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome> {
        let descriptor = valid.descriptor();
        let kind = descriptor.kind();
        let output = descriptor.config.output().to_path_buf();
        let staged = staged_path(&output, descriptor.id);

        info!(id = %descriptor.id, %kind, status = %JobStatus::Queued, "job accepted");

        if cancel.is_cancelled() {
            info!(id = %descriptor.id, %kind, status = %JobStatus::Cancelled, "cancelled before start");
            return Err(EngineError::Cancelled { kind });
        }

        info!(id = %descriptor.id, %kind, status = %JobStatus::Running, "job started");

        let execution = backend.execute(&descriptor.config, &staged, cancel);
        let result = tokio::select! {
            // Checked first so an external cancel is reported as Cancelled
            // even when the back-end errors out in the same instant.
            biased;
            _ = cancel.cancelled() => Err(EngineError::Cancelled { kind }),
            res = tokio::time::timeout(self.deadline, execution) => match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(diagnostic)) => Err(EngineError::Backend {
                    kind,
                    // {:#} flattens the anyhow context chain into one line
                    diagnostic: format!("{diagnostic:#}"),
                }),
                Err(_) => {
                    cancel.cancel();
                    Err(EngineError::Timeout {
                        kind,
                        deadline: self.deadline,
                    })
                }
            },
        };

        match result {
            Ok(()) => {
                if let Err(e) = tokio::fs::rename(&staged, &output).await {
                    discard_staged(&staged).await;
                    return Err(EngineError::Io(e));
                }
                info!(id = %descriptor.id, %kind, status = %JobStatus::Succeeded, output = %output.display(), "job finished");
                Ok(JobOutcome {
                    id: descriptor.id,
                    kind,
                    output,
                    finished_at: Utc::now(),
                })
            }
            Err(err) => {
                discard_staged(&staged).await;
                let status = match &err {
                    EngineError::Timeout { .. } => JobStatus::TimedOut,
                    EngineError::Cancelled { .. } => JobStatus::Cancelled,
                    _ => JobStatus::Failed,
                };
                warn!(id = %descriptor.id, %kind, %status, error = %err, "job did not complete");
                Err(err)
            }
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

/// Staged sibling of the declared output, unique per job id.
fn staged_path(output: &Path, id: Uuid) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    output.with_file_name(format!("{file_name}.{}.tmp", id.simple()))
}

async fn discard_staged(staged: &Path) {
    match tokio::fs::remove_file(staged).await {
        Ok(()) => debug!(staged = %staged.display(), "discarded staged output"),
        // Nothing staged is the common case for early failures.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(staged = %staged.display(), error = %e, "failed to discard staged output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CapabilityRegistry;
    use crate::validate::validate;
    use artifex_core::{JobConfig, JobDescriptor, JobKind, MinifyConfig};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted back-end for exercising the executor's failure paths.
    struct ScriptedBackend {
        kind: JobKind,
        calls: AtomicUsize,
        behavior: Behavior,
    }

    enum Behavior {
        Succeed,
        FailMidWrite,
        Hang,
        IgnoreCancelBriefly,
    }

    impl ScriptedBackend {
        fn new(kind: JobKind, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
                behavior,
            })
        }
    }

    #[async_trait]
    impl crate::backend::Backend for ScriptedBackend {
        fn kind(&self) -> JobKind {
            self.kind
        }

        async fn execute(
            &self,
            _config: &JobConfig,
            staged: &Path,
            cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed => {
                    tokio::fs::write(staged, b"minified").await?;
                    Ok(())
                }
                Behavior::FailMidWrite => {
                    tokio::fs::write(staged, b"trunc").await?;
                    anyhow::bail!("disk fell over halfway through")
                }
                Behavior::Hang => {
                    cancel.cancelled().await;
                    anyhow::bail!("interrupted")
                }
                Behavior::IgnoreCancelBriefly => {
                    tokio::fs::write(staged, b"late").await?;
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    fn minify_job(dir: &Path) -> (ValidDescriptor, CapabilityRegistry, Arc<ScriptedBackend>) {
        minify_job_with(dir, Behavior::Succeed)
    }

    fn minify_job_with(
        dir: &Path,
        behavior: Behavior,
    ) -> (ValidDescriptor, CapabilityRegistry, Arc<ScriptedBackend>) {
        let input = dir.join("a.js");
        std::fs::write(&input, "let x = 1;").unwrap();
        let backend = ScriptedBackend::new(JobKind::Minify, behavior);
        let mut registry = CapabilityRegistry::new();
        registry.register(backend.clone()).unwrap();
        let descriptor = JobDescriptor::new(JobConfig::Minify(MinifyConfig {
            input,
            output: dir.join("a.min.js"),
        }));
        let valid = validate(&registry, descriptor).unwrap();
        (valid, registry, backend)
    }

    #[tokio::test]
    async fn test_success_publishes_declared_output() {
        let dir = tempfile::tempdir().unwrap();
        let (valid, registry, backend) = minify_job(dir.path());
        let resolved = registry.resolve(JobKind::Minify).unwrap();

        let outcome = Executor::new()
            .run(&valid, resolved, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.kind, JobKind::Minify);
        assert_eq!(outcome.output, dir.path().join("a.min.js"));
        assert_eq!(
            std::fs::read_to_string(&outcome.output).unwrap(),
            "minified"
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_write_leaves_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let (valid, registry, _backend) = minify_job_with(dir.path(), Behavior::FailMidWrite);
        let output = dir.path().join("a.min.js");
        std::fs::write(&output, "previous artifact").unwrap();

        let err = Executor::new()
            .run(
                &valid,
                registry.resolve(JobKind::Minify).unwrap(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Backend { .. }));
        // Prior content untouched, staged write discarded.
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous artifact");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2); // a.js + prior output
    }

    #[tokio::test]
    async fn test_failure_without_prior_output_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (valid, registry, _backend) = minify_job_with(dir.path(), Behavior::FailMidWrite);

        let err = Executor::new()
            .run(
                &valid,
                registry.resolve(JobKind::Minify).unwrap(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Backend { .. }));
        assert!(!dir.path().join("a.min.js").exists());
    }

    #[tokio::test]
    async fn test_timeout_reports_and_discards() {
        let dir = tempfile::tempdir().unwrap();
        let (valid, registry, _backend) =
            minify_job_with(dir.path(), Behavior::IgnoreCancelBriefly);

        let err = Executor::new()
            .with_deadline(Duration::from_millis(50))
            .run(
                &valid,
                registry.resolve(JobKind::Minify).unwrap(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Timeout { .. }));
        assert!(!dir.path().join("a.min.js").exists());
    }

    #[tokio::test]
    async fn test_cancellation_yields_cancelled_and_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let (valid, registry, _backend) = minify_job_with(dir.path(), Behavior::Hang);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = Executor::new()
            .run(&valid, registry.resolve(JobKind::Minify).unwrap(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Cancelled { kind: JobKind::Minify }));
        assert!(!dir.path().join("a.min.js").exists());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_invokes_backend() {
        let dir = tempfile::tempdir().unwrap();
        let (valid, registry, backend) = minify_job(dir.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = Executor::new()
            .run(&valid, registry.resolve(JobKind::Minify).unwrap(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Cancelled { .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
