//! Capability back-end seam
//!
//! Back-ends are opaque to the engine: the orchestrator does not know that
//! the TypeScript back-end type-checks or that the bundle back-end resolves
//! a dependency graph. The whole contract is the [`Backend`] trait.

use artifex_core::{JobConfig, JobKind};
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// One registered capability.
///
/// Contract with the engine:
/// - `execute` is invoked at most once per job
/// - the back-end writes its artifact only to `staged`, never to the
///   declared output locator; the executor publishes `staged` atomically on
///   success and discards it on failure, so a partial artifact is never
///   observable
/// - `cancel` is a cooperative stop signal; a back-end that ignores it is
///   still abandoned and its staged output discarded
/// - errors are returned as diagnostics; the engine carries them opaquely
#[async_trait]
pub trait Backend: Send + Sync {
    /// The kind this back-end executes.
    fn kind(&self) -> JobKind;

    /// Runs the transformation described by `config`, writing to `staged`.
    async fn execute(
        &self,
        config: &JobConfig,
        staged: &Path,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;
}
