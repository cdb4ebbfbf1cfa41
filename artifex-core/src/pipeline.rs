//! Pipeline domain types

use crate::job::JobConfig;
use serde::{Deserialize, Serialize};

/// An ordered chain of jobs submitted and executed as one logical unit.
///
/// For every adjacent pair, stage n's declared output must be consumed by
/// stage n+1; the composer checks this wiring before anything runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub stages: Vec<JobConfig>,

    /// Remove already-published upstream outputs when a later stage fails.
    ///
    /// Off by default: completed intermediates are valid artifacts in
    /// their own right.
    #[serde(default)]
    pub cleanup_on_failure: bool,
}

impl PipelineSpec {
    pub fn new(stages: Vec<JobConfig>) -> Self {
        Self {
            stages,
            cleanup_on_failure: false,
        }
    }

    pub fn with_cleanup_on_failure(mut self) -> Self {
        self.cleanup_on_failure = true;
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
