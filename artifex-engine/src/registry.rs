//! Capability registry
//!
//! Maps each job kind to the back-end that can execute it. Populated at
//! process start and read-only thereafter; lookup is safe from any number
//! of in-flight jobs once the registry is shared behind an `Arc`.

use crate::backend::Backend;
use artifex_core::{EngineError, JobKind, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of executable back-ends, one per job kind.
///
/// Pure bookkeeping: no side effects beyond the map itself. Re-registering
/// a kind is rejected with [`EngineError::DuplicateCapability`]; a fixed
/// registry is the point, and replacing a back-end mid-setup is almost
/// always a wiring mistake.
#[derive(Default)]
pub struct CapabilityRegistry {
    backends: HashMap<JobKind, Arc<dyn Backend>>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registers a back-end under its own declared kind.
    pub fn register(&mut self, backend: Arc<dyn Backend>) -> Result<()> {
        let kind = backend.kind();
        if self.backends.contains_key(&kind) {
            return Err(EngineError::DuplicateCapability(kind));
        }
        self.backends.insert(kind, backend);
        Ok(())
    }

    /// Returns the back-end for a kind.
    pub fn resolve(&self, kind: JobKind) -> Result<Arc<dyn Backend>> {
        self.backends
            .get(&kind)
            .cloned()
            .ok_or(EngineError::UnknownCapability(kind))
    }

    /// Whether a back-end is registered for the kind.
    pub fn contains(&self, kind: JobKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// All registered kinds, in no particular order.
    pub fn kinds(&self) -> Vec<JobKind> {
        self.backends.keys().copied().collect()
    }
}
