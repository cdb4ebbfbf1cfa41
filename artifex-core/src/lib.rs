//! Artifex Core
//!
//! Core types and abstractions for the Artifex transformation orchestrator.
//!
//! This crate contains:
//! - Domain types: Job kinds, per-kind configurations, descriptors, outcomes
//! - Error taxonomy: Typed failures shared by the engine, back-ends, and CLI

pub mod error;
pub mod job;
pub mod pipeline;

pub use error::{EngineError, Result, ValidationError};
pub use job::{
    BundleConfig, CompileConfig, JobConfig, JobDescriptor, JobKind, JobOutcome, JobStatus,
    MinifyConfig, RegexConfig, WasmConfig,
};
pub use pipeline::PipelineSpec;
