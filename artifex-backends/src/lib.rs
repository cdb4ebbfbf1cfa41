//! Artifex Back-ends
//!
//! Built-in capability back-ends for the five transformation kinds:
//! - TypeScript compilation and minification delegate to external tools
//!   (`tsc`, `terser`), as does WebAssembly lowering (`wat2wasm`)
//! - Pattern rewriting and bundling are native passes
//!
//! Every back-end honors the engine contract: it writes only to the staged
//! path it is handed and returns a diagnostic error without publishing
//! anything on failure.

mod bundle;
mod minify;
mod rewrite;
mod tool;
mod typescript;
mod wasm;

pub use bundle::BundleBackend;
pub use minify::MinifyBackend;
pub use rewrite::RegexTransformBackend;
pub use typescript::TypeScriptCompileBackend;
pub use wasm::WasmLowerBackend;

use artifex_core::Result;
use artifex_engine::CapabilityRegistry;
use std::sync::Arc;

/// Registers the default back-end for every kind.
pub fn register_builtin(registry: &mut CapabilityRegistry) -> Result<()> {
    registry.register(Arc::new(TypeScriptCompileBackend::default()))?;
    registry.register(Arc::new(RegexTransformBackend))?;
    registry.register(Arc::new(MinifyBackend::default()))?;
    registry.register(Arc::new(BundleBackend))?;
    registry.register(Arc::new(WasmLowerBackend::default()))?;
    Ok(())
}
