//! Artifex Engine
//!
//! The job dispatch and execution core of the Artifex orchestrator.
//!
//! Architecture:
//! - Registry: Maps each job kind to the back-end that can execute it
//! - Validator: Rejects malformed descriptors before any back-end runs
//! - Executor: Runs one validated job with staging and atomic publish
//! - Composer: Chains jobs into all-or-nothing sequential pipelines
//! - Orchestrator: The single façade external callers use
//!
//! Data flow: caller → façade → composer (if multi-stage) → validator →
//! executor → back-end, with the outcome bubbling back as a typed result.

pub mod backend;
pub mod executor;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod validate;

pub use backend::Backend;
pub use executor::Executor;
pub use orchestrator::{JobHandle, Orchestrator};
pub use pipeline::PipelineComposer;
pub use registry::CapabilityRegistry;
pub use validate::{ValidDescriptor, validate};
