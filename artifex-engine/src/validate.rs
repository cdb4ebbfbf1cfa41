//! Descriptor validation
//!
//! Rejects malformed descriptors before any back-end runs. Fail-fast: the
//! first violated check is reported, and nothing is repaired or defaulted
//! beyond the documented configuration defaults. All probes are read-level;
//! validation never mutates an input or output location.

use crate::registry::CapabilityRegistry;
use artifex_core::{EngineError, JobConfig, JobDescriptor, Result, ValidationError};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A descriptor that passed every check.
///
/// The executor only accepts this type, so an unvalidated descriptor can
/// never reach a back-end.
#[derive(Debug)]
pub struct ValidDescriptor(JobDescriptor);

impl ValidDescriptor {
    pub fn descriptor(&self) -> &JobDescriptor {
        &self.0
    }

    pub fn into_inner(self) -> JobDescriptor {
        self.0
    }
}

/// Validates a descriptor against the registry and the filesystem.
///
/// Checks, in order: kind registered → configuration shape (bundle inputs
/// present and unique) → inputs addressable → output's containing location
/// accepts a new entry (the output itself need not exist) → kind-specific
/// syntax (pattern compiles, wasm input format recognized).
pub fn validate(registry: &CapabilityRegistry, descriptor: JobDescriptor) -> Result<ValidDescriptor> {
    let kind = descriptor.kind();
    if !registry.contains(kind) {
        return Err(EngineError::UnknownCapability(kind));
    }
    // Rejections carry the kind so callers never lose the origin.
    let invalid = |source| EngineError::Validation { kind, source };

    check_shape(&descriptor.config).map_err(invalid)?;

    for input in descriptor.config.inputs() {
        check_readable(input).map_err(invalid)?;
    }
    check_output_location(descriptor.config.output()).map_err(invalid)?;

    check_syntax(&descriptor.config).map_err(invalid)?;

    debug!(id = %descriptor.id, %kind, "descriptor validated");
    Ok(ValidDescriptor(descriptor))
}

fn check_shape(config: &JobConfig) -> std::result::Result<(), ValidationError> {
    if let JobConfig::Bundle(bundle) = config {
        if bundle.inputs.is_empty() {
            return Err(ValidationError::NoInputs);
        }
        let mut seen = HashSet::new();
        for input in &bundle.inputs {
            if !seen.insert(input) {
                return Err(ValidationError::DuplicateInput(input.clone()));
            }
        }
    }
    Ok(())
}

fn check_readable(path: &Path) -> std::result::Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::MissingInput(path.to_path_buf()));
    }
    // Open-and-drop read probe; existence alone does not imply permission.
    fs::File::open(path).map_err(|e| ValidationError::UnreadableInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn check_output_location(output: &Path) -> std::result::Result<(), ValidationError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Ok(()),
        _ => Err(ValidationError::UnwritableOutput(output.to_path_buf())),
    }
}

fn check_syntax(config: &JobConfig) -> std::result::Result<(), ValidationError> {
    match config {
        JobConfig::RegexTransform(c) => {
            if c.pattern.is_empty() {
                return Err(ValidationError::EmptyPattern);
            }
            regex::Regex::new(&c.pattern).map_err(|e| ValidationError::MalformedPattern {
                pattern: c.pattern.clone(),
                reason: e.to_string(),
            })?;
            Ok(())
        }
        JobConfig::WasmTransform(c) => match c.input.extension().and_then(|e| e.to_str()) {
            Some("wat" | "wast" | "wasm") => Ok(()),
            _ => Err(ValidationError::UnrecognizedWasmInput(c.input.clone())),
        },
        _ => Ok(()),
    }
}
