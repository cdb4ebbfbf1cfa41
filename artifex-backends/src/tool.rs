//! External tool invocation
//!
//! Shared plumbing for back-ends that delegate to an external compiler
//! binary. The child is spawned with `kill_on_drop`, so cooperative
//! cancellation tears the process down when the wait future is dropped.

use anyhow::Context;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs an external tool to completion, treating a non-zero exit as a
/// failure with the tool's stderr as the diagnostic.
pub(crate) async fn run_tool(
    program: &str,
    args: Vec<OsString>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    debug!(%program, ?args, "invoking external tool");

    let child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to launch '{program}'"))?;

    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => anyhow::bail!("'{program}' interrupted by cancellation"),
        output = child.wait_with_output() => {
            output.with_context(|| format!("failed waiting for '{program}'"))?
        }
    };

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "'{program}' exited with {}: {}",
            output.status,
            stderr.trim()
        )
    }
}
