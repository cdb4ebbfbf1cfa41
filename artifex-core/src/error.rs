//! Error taxonomy for the Artifex engine
//!
//! Every failure a caller can observe is a typed value here; back-end
//! errors are carried opaquely as diagnostics and never escape unlabeled.

use crate::job::JobKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures surfaced by the orchestrator.
///
/// Nothing here is fatal to the process: a failing job never crashes the
/// façade or corrupts the registry, and the engine performs no implicit
/// retries.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Kind was never registered; a caller/config bug, never retried
    #[error("no capability registered for kind '{0}'")]
    UnknownCapability(JobKind),

    /// Kind already has a back-end; the registry rejects replacement
    #[error("capability for kind '{0}' is already registered")]
    DuplicateCapability(JobKind),

    /// Descriptor rejected before any back-end ran
    #[error("validation of '{kind}' job failed: {source}")]
    Validation {
        kind: JobKind,
        #[source]
        source: ValidationError,
    },

    /// The capability itself failed; diagnostic is the back-end's payload
    #[error("back-end for '{kind}' failed: {diagnostic}")]
    Backend { kind: JobKind, diagnostic: String },

    /// Deadline exceeded; no partial output retained
    #[error("job '{kind}' exceeded its deadline of {deadline:?}")]
    Timeout { kind: JobKind, deadline: Duration },

    /// Explicit cancellation honored
    #[error("job '{kind}' was cancelled")]
    Cancelled { kind: JobKind },

    /// Adjacent pipeline stages do not chain; raised before any stage runs
    #[error(
        "pipeline wiring error at stage {index}: expected input '{}', found '{}'",
        .expected.display(),
        .found.display()
    )]
    PipelineWiring {
        index: usize,
        expected: PathBuf,
        found: PathBuf,
    },

    /// A pipeline stage failed; wraps the stage's own failure with its
    /// 0-based position
    #[error("pipeline stage {index} ({kind}) failed: {source}")]
    Stage {
        index: usize,
        kind: JobKind,
        #[source]
        source: Box<EngineError>,
    },

    /// A pipeline with no stages has nothing to execute
    #[error("pipeline contains no stages")]
    EmptyPipeline,

    /// The façade is draining and no longer accepts submissions
    #[error("orchestrator is shutting down")]
    ShuttingDown,

    /// Filesystem failure while staging or publishing an artifact
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// The kind that originated this failure, when one applies.
    pub fn kind(&self) -> Option<JobKind> {
        match self {
            EngineError::UnknownCapability(kind)
            | EngineError::DuplicateCapability(kind)
            | EngineError::Validation { kind, .. }
            | EngineError::Backend { kind, .. }
            | EngineError::Timeout { kind, .. }
            | EngineError::Cancelled { kind }
            | EngineError::Stage { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The failing stage's position, for pipeline failures.
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            EngineError::Stage { index, .. } | EngineError::PipelineWiring { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    /// Whether the job was rejected before any back-end ran.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownCapability(_)
                | EngineError::Validation { .. }
                | EngineError::PipelineWiring { .. }
                | EngineError::EmptyPipeline
                | EngineError::ShuttingDown
        )
    }
}

/// Reasons a descriptor can fail validation.
///
/// Fail-fast: the first violated check is reported.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("input '{}' does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("input '{}' is not readable: {reason}", .path.display())]
    UnreadableInput { path: PathBuf, reason: String },

    #[error("output location '{}' does not accept new entries", .0.display())]
    UnwritableOutput(PathBuf),

    #[error("empty pattern is not a valid matcher")]
    EmptyPattern,

    #[error("pattern '{pattern}' does not compile: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    #[error("bundle requires at least one input")]
    NoInputs,

    #[error("duplicate bundle input '{}'", .0.display())]
    DuplicateInput(PathBuf),

    #[error("input '{}' is not a recognized wasm source", .0.display())]
    UnrecognizedWasmInput(PathBuf),
}
