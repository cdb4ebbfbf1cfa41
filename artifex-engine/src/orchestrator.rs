//! Orchestrator façade
//!
//! The single public surface external callers use. Owns the process-wide
//! capability registry and default execution limits, tracks in-flight work
//! for cancellation, and drains cleanly on shutdown.
//!
//! Unrelated submissions run concurrently with no ordering between them.
//! The engine does not arbitrate two independent jobs declaring the same
//! output locator; that is a caller configuration error, and last-writer-
//! wins between such jobs is undefined behavior.

use crate::executor::Executor;
use crate::pipeline::PipelineComposer;
use crate::registry::CapabilityRegistry;
use crate::validate::validate;
use artifex_core::{EngineError, JobConfig, JobDescriptor, JobOutcome, PipelineSpec, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// How long cancelled stragglers get to discard staged work before
/// shutdown returns anyway.
const STRAGGLER_SETTLE: Duration = Duration::from_secs(1);

/// The orchestrator façade.
///
/// Constructed once at startup with a populated registry; submissions read
/// the registry concurrently and never mutate it.
pub struct Orchestrator {
    registry: Arc<CapabilityRegistry>,
    executor: Executor,
    inflight: Mutex<HashMap<Uuid, CancellationToken>>,
    accepting: AtomicBool,
    drained: Notify,
}

impl Orchestrator {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            executor: Executor::new(),
            inflight: Mutex::new(HashMap::new()),
            accepting: AtomicBool::new(true),
            drained: Notify::new(),
        }
    }

    /// Overrides the default per-job deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.executor = self.executor.with_deadline(deadline);
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Submits one job and waits for its outcome.
    ///
    /// The job's input and output locators are assumed exclusive to it for
    /// the duration of the run.
    pub async fn submit(&self, config: JobConfig) -> Result<JobOutcome> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(EngineError::ShuttingDown);
        }
        let descriptor = JobDescriptor::new(config);
        let id = descriptor.id;
        let cancel = self.track(id);
        let result = self.run_job(descriptor, &cancel).await;
        self.untrack(id);
        result
    }

    /// Submits an ordered chain of jobs as one logical unit.
    ///
    /// The whole pipeline shares one id for cancellation; deadlines apply
    /// per stage.
    pub async fn submit_pipeline(&self, spec: PipelineSpec) -> Result<JobOutcome> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(EngineError::ShuttingDown);
        }
        let id = Uuid::new_v4();
        let cancel = self.track(id);
        let composer = PipelineComposer::new(&self.registry, &self.executor);
        let result = composer.run(&spec, &cancel).await;
        self.untrack(id);
        result
    }

    /// Submits a job on a background task, returning its id immediately.
    pub fn spawn_job(self: &Arc<Self>, config: JobConfig) -> JobHandle {
        if !self.accepting.load(Ordering::Acquire) {
            return JobHandle::rejected();
        }
        let descriptor = JobDescriptor::new(config);
        let id = descriptor.id;
        let cancel = self.track(id);
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = this.run_job(descriptor, &cancel).await;
            this.untrack(id);
            result
        });
        JobHandle {
            id,
            task: Some(task),
        }
    }

    /// Submits a pipeline on a background task, returning its id
    /// immediately.
    pub fn spawn_pipeline(self: &Arc<Self>, spec: PipelineSpec) -> JobHandle {
        if !self.accepting.load(Ordering::Acquire) {
            return JobHandle::rejected();
        }
        let id = Uuid::new_v4();
        let cancel = self.track(id);
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let composer = PipelineComposer::new(&this.registry, &this.executor);
            let result = composer.run(&spec, &cancel).await;
            this.untrack(id);
            result
        });
        JobHandle {
            id,
            task: Some(task),
        }
    }

    /// Requests cancellation of an in-flight job or pipeline.
    ///
    /// Best-effort and cooperative; returns whether the id was in flight
    /// and the signal was accepted.
    pub fn cancel(&self, id: Uuid) -> bool {
        let found = self.lock_inflight().get(&id).cloned();
        match found {
            Some(token) => {
                info!(%id, "cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Stops accepting submissions and drains in-flight work.
    ///
    /// Jobs still running when the grace deadline expires are cancelled
    /// cooperatively; their staged outputs are discarded by the executor
    /// within a bounded settle window before this returns.
    pub async fn shutdown(&self, grace: Duration) {
        self.accepting.store(false, Ordering::Release);
        info!("orchestrator shutting down, draining in-flight work");

        let deadline = tokio::time::Instant::now() + grace;
        loop {
            let notified = self.drained.notified();
            if self.lock_inflight().is_empty() {
                info!("orchestrator drained");
                return;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                break;
            }
        }

        let stragglers: Vec<CancellationToken> =
            self.lock_inflight().values().cloned().collect();
        warn!(
            remaining = stragglers.len(),
            "grace deadline reached, cancelling remaining work"
        );
        for token in stragglers {
            token.cancel();
        }

        // Cancelled jobs still discard their staged outputs; give them a
        // bounded window to settle before the caller is free to exit.
        let settle = tokio::time::Instant::now() + STRAGGLER_SETTLE;
        loop {
            let notified = self.drained.notified();
            if self.lock_inflight().is_empty() {
                info!("orchestrator drained after cancellation");
                return;
            }
            if tokio::time::timeout_at(settle, notified).await.is_err() {
                warn!("cancelled work did not settle in time");
                return;
            }
        }
    }

    async fn run_job(
        &self,
        descriptor: JobDescriptor,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome> {
        let kind = descriptor.kind();
        let valid = validate(&self.registry, descriptor)?;
        let backend = self.registry.resolve(kind)?;
        self.executor.run(&valid, backend, cancel).await
    }

    fn track(&self, id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        self.lock_inflight().insert(id, token.clone());
        token
    }

    fn untrack(&self, id: Uuid) {
        let empty = {
            let mut inflight = self.lock_inflight();
            inflight.remove(&id);
            inflight.is_empty()
        };
        if empty {
            self.drained.notify_waiters();
        }
    }

    fn lock_inflight(&self) -> MutexGuard<'_, HashMap<Uuid, CancellationToken>> {
        // Poisoning only happens if a holder panicked; the map stays usable.
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to a job or pipeline running on a background task.
pub struct JobHandle {
    id: Uuid,
    task: Option<JoinHandle<Result<JobOutcome>>>,
}

impl JobHandle {
    /// The submission id, usable with [`Orchestrator::cancel`].
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the outcome.
    pub async fn wait(self) -> Result<JobOutcome> {
        match self.task {
            Some(task) => match task.await {
                Ok(result) => result,
                Err(e) => Err(EngineError::Io(std::io::Error::other(format!(
                    "job task failed: {e}"
                )))),
            },
            None => Err(EngineError::ShuttingDown),
        }
    }

    fn rejected() -> Self {
        Self {
            id: Uuid::nil(),
            task: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use artifex_core::{
        BundleConfig, CompileConfig, JobKind, MinifyConfig, ValidationError,
    };
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    struct RecordingBackend {
        kind: JobKind,
        calls: AtomicUsize,
        delay: Option<Duration>,
        stage_early: bool,
    }

    impl RecordingBackend {
        fn new(kind: JobKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
                delay: None,
                stage_early: false,
            })
        }

        fn slow(kind: JobKind, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
                delay: Some(delay),
                stage_early: false,
            })
        }

        /// Writes the staged output first, then stalls until cancelled.
        fn stalled(kind: JobKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
                delay: Some(Duration::from_secs(3600)),
                stage_early: true,
            })
        }
    }

    #[async_trait]
    impl Backend for RecordingBackend {
        fn kind(&self) -> JobKind {
            self.kind
        }

        async fn execute(
            &self,
            config: &JobConfig,
            staged: &Path,
            cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stage_early {
                tokio::fs::write(staged, b"partial").await?;
            }
            if let Some(delay) = self.delay {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => anyhow::bail!("stopped"),
                }
            }
            let text = tokio::fs::read_to_string(config.inputs()[0]).await?;
            tokio::fs::write(staged, text).await?;
            Ok(())
        }
    }

    fn orchestrator_with(backends: Vec<Arc<RecordingBackend>>) -> Arc<Orchestrator> {
        let mut registry = CapabilityRegistry::new();
        for backend in backends {
            registry.register(backend).unwrap();
        }
        Arc::new(Orchestrator::new(registry))
    }

    #[tokio::test]
    async fn test_submit_minify_succeeds_with_declared_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "let x = 1;").unwrap();
        let backend = RecordingBackend::new(JobKind::Minify);
        let orchestrator = orchestrator_with(vec![backend.clone()]);

        let outcome = orchestrator
            .submit(JobConfig::Minify(MinifyConfig {
                input: dir.path().join("a.js"),
                output: dir.path().join("a.min.js"),
            }))
            .await
            .unwrap();

        assert_eq!(outcome.kind, JobKind::Minify);
        assert_eq!(outcome.output, dir.path().join("a.min.js"));
        assert!(outcome.output.exists());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_bundle_inputs_rejected_before_backend() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "let x = 1;").unwrap();
        let backend = RecordingBackend::new(JobKind::Bundle);
        let orchestrator = orchestrator_with(vec![backend.clone()]);

        let err = orchestrator
            .submit(JobConfig::Bundle(BundleConfig {
                inputs: vec![dir.path().join("a.js"), dir.path().join("a.js")],
                output: dir.path().join("out.js"),
            }))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Validation {
                source: ValidationError::DuplicateInput(_),
                ..
            }
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_capability_reported() {
        let orchestrator = orchestrator_with(vec![]);
        let err = orchestrator
            .submit(JobConfig::Minify(MinifyConfig {
                input: "a.js".into(),
                output: "a.min.js".into(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownCapability(JobKind::Minify)
        ));
    }

    #[tokio::test]
    async fn test_pipeline_compile_then_minify() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.ts"), "let x: number = 1;").unwrap();
        let orchestrator = orchestrator_with(vec![
            RecordingBackend::new(JobKind::TypeScriptCompile),
            RecordingBackend::new(JobKind::Minify),
        ]);

        let outcome = orchestrator
            .submit_pipeline(PipelineSpec::new(vec![
                JobConfig::TypeScriptCompile(CompileConfig {
                    input: dir.path().join("x.ts"),
                    output: dir.path().join("x.js"),
                }),
                JobConfig::Minify(MinifyConfig {
                    input: dir.path().join("x.js"),
                    output: dir.path().join("x.min.js"),
                }),
            ]))
            .await
            .unwrap();

        assert_eq!(outcome.output, dir.path().join("x.min.js"));
        assert!(dir.path().join("x.js").exists());
        assert!(dir.path().join("x.min.js").exists());
    }

    #[tokio::test]
    async fn test_cancel_inflight_job() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "let x = 1;").unwrap();
        let orchestrator = orchestrator_with(vec![RecordingBackend::slow(
            JobKind::Minify,
            Duration::from_secs(3600),
        )]);

        let handle = orchestrator.spawn_job(JobConfig::Minify(MinifyConfig {
            input: dir.path().join("a.js"),
            output: dir.path().join("a.min.js"),
        }));
        let id = handle.id();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orchestrator.cancel(id));

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled { .. }));
        assert!(!dir.path().join("a.min.js").exists());

        // The id is gone once the job settles.
        assert!(!orchestrator.cancel(id));
    }

    #[tokio::test]
    async fn test_cancel_unknown_id_refused() {
        let orchestrator = orchestrator_with(vec![]);
        assert!(!orchestrator.cancel(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_submissions() {
        let orchestrator = orchestrator_with(vec![RecordingBackend::new(JobKind::Minify)]);
        orchestrator.shutdown(Duration::from_millis(10)).await;

        let err = orchestrator
            .submit(JobConfig::Minify(MinifyConfig {
                input: "a.js".into(),
                output: "a.min.js".into(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ShuttingDown));

        let err = orchestrator
            .submit_pipeline(PipelineSpec::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ShuttingDown));
    }

    #[tokio::test]
    async fn test_shutdown_discards_staged_work_of_cancelled_stragglers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "let x = 1;").unwrap();
        let orchestrator = orchestrator_with(vec![RecordingBackend::stalled(JobKind::Minify)]);

        let handle = orchestrator.spawn_job(JobConfig::Minify(MinifyConfig {
            input: dir.path().join("a.js"),
            output: dir.path().join("a.min.js"),
        }));

        // Let the job stage its partial output, then shut down with a grace
        // window it cannot meet.
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.shutdown(Duration::from_millis(10)).await;

        // By the time shutdown returns, the staged sibling is already gone;
        // a caller exiting immediately afterwards leaves nothing behind.
        let leftovers: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "staged outputs left behind: {leftovers:?}");
        assert!(!dir.path().join("a.min.js").exists());

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_drains_inflight_work() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.js"), "let x = 1;").unwrap();
        let orchestrator = orchestrator_with(vec![RecordingBackend::slow(
            JobKind::Minify,
            Duration::from_millis(100),
        )]);

        let handle = orchestrator.spawn_job(JobConfig::Minify(MinifyConfig {
            input: dir.path().join("a.js"),
            output: dir.path().join("a.min.js"),
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.shutdown(Duration::from_secs(5)).await;

        let outcome = handle.wait().await.unwrap();
        assert!(outcome.output.exists());
    }
}
