//! Job domain types
//!
//! A job is one requested transformation: a kind, a kind-specific
//! configuration, and the input/output locators it reads and writes.
//! Descriptors are immutable once constructed and discarded after their
//! outcome is delivered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The closed set of transformation kinds the engine can dispatch.
///
/// Extending this set is a deliberate change: a new variant here, a new
/// configuration shape, and a new back-end registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    #[serde(rename = "typescript-compile")]
    TypeScriptCompile,
    RegexTransform,
    Minify,
    Bundle,
    WasmTransform,
}

impl JobKind {
    /// All kinds, in registration order.
    pub const ALL: [JobKind; 5] = [
        JobKind::TypeScriptCompile,
        JobKind::RegexTransform,
        JobKind::Minify,
        JobKind::Bundle,
        JobKind::WasmTransform,
    ];
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::TypeScriptCompile => write!(f, "typescript-compile"),
            JobKind::RegexTransform => write!(f, "regex-transform"),
            JobKind::Minify => write!(f, "minify"),
            JobKind::Bundle => write!(f, "bundle"),
            JobKind::WasmTransform => write!(f, "wasm-transform"),
        }
    }
}

// =============================================================================
// Per-kind configuration shapes
// =============================================================================

/// Configuration for TypeScript-to-JavaScript compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Configuration for a pattern-based rewrite pass.
///
/// `replacement` defaults to the empty string, which strips every match
/// (the dominant use: removing comments or dead directives).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Configuration for minification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinifyConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Configuration for multi-file bundling.
///
/// `inputs` is ordered: earlier entries take precedence during
/// concatenation/resolution. Duplicates are rejected at validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Configuration for WebAssembly lowering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// One configuration shape per kind, tagged so validation stays exhaustive.
///
/// Adding a kind means adding a variant here; a catch-all shape with
/// optional fields is deliberately avoided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JobConfig {
    #[serde(rename = "typescript-compile")]
    TypeScriptCompile(CompileConfig),
    RegexTransform(RegexConfig),
    Minify(MinifyConfig),
    Bundle(BundleConfig),
    WasmTransform(WasmConfig),
}

impl JobConfig {
    /// The kind this configuration belongs to.
    pub fn kind(&self) -> JobKind {
        match self {
            JobConfig::TypeScriptCompile(_) => JobKind::TypeScriptCompile,
            JobConfig::RegexTransform(_) => JobKind::RegexTransform,
            JobConfig::Minify(_) => JobKind::Minify,
            JobConfig::Bundle(_) => JobKind::Bundle,
            JobConfig::WasmTransform(_) => JobKind::WasmTransform,
        }
    }

    /// All input locators this job reads, in declared order.
    pub fn inputs(&self) -> Vec<&Path> {
        match self {
            JobConfig::TypeScriptCompile(c) => vec![&c.input],
            JobConfig::RegexTransform(c) => vec![&c.input],
            JobConfig::Minify(c) => vec![&c.input],
            JobConfig::Bundle(c) => c.inputs.iter().map(PathBuf::as_path).collect(),
            JobConfig::WasmTransform(c) => vec![&c.input],
        }
    }

    /// The single output locator this job declares.
    pub fn output(&self) -> &Path {
        match self {
            JobConfig::TypeScriptCompile(c) => &c.output,
            JobConfig::RegexTransform(c) => &c.output,
            JobConfig::Minify(c) => &c.output,
            JobConfig::Bundle(c) => &c.output,
            JobConfig::WasmTransform(c) => &c.output,
        }
    }

    /// Whether this job reads the given artifact.
    ///
    /// Used for pipeline wiring: stage n+1 must consume stage n's output.
    pub fn consumes(&self, artifact: &Path) -> bool {
        self.inputs().iter().any(|input| *input == artifact)
    }

    /// The input locator reported when pipeline wiring fails.
    ///
    /// For single-input kinds this is the declared input; for a bundle it
    /// is the first entry (the highest-precedence input).
    pub fn primary_input(&self) -> &Path {
        match self {
            JobConfig::Bundle(c) => c.inputs.first().map(PathBuf::as_path).unwrap_or(&c.output),
            other => other.inputs()[0],
        }
    }
}

// =============================================================================
// Descriptor, status, outcome
// =============================================================================

/// One submitted job: kind-specific configuration plus a process-unique id
/// assigned at submission, used for log correlation and cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: Uuid,
    pub config: JobConfig,
    pub submitted_at: DateTime<Utc>,
}

impl JobDescriptor {
    /// Wraps a configuration with a fresh id and submission timestamp.
    pub fn new(config: JobConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            submitted_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> JobKind {
        self.config.kind()
    }
}

/// Job execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
            JobStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Success marker for one executed job.
///
/// Failures are carried as [`EngineError`](crate::error::EngineError)
/// values; an outcome is never partial. The `output` locator is the
/// published artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub id: Uuid,
    pub kind: JobKind,
    pub output: PathBuf,
    pub finished_at: DateTime<Utc>,
}
