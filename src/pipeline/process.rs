//! External tool execution.
//!
//! Tools run synchronously from the pipeline's point of view: each
//! invocation suspends the stage until the subprocess terminates. The child
//! working directory is passed explicitly per invocation; the parent
//! process's current directory is never mutated, so no stage can leak a
//! stale directory context to the next.

use crate::config::ToolCommand;
use crate::error::{PipelineError, Result};
use std::path::Path;
use tokio::process::Command;

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the tool exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an external tool in the given working directory, capturing its
/// output and exit status.
///
/// A nonzero exit status is not an error here; callers inspect
/// [`ToolOutput::success`] and apply the fail-fast policy. Spawn failures
/// (missing program, permissions) surface as [`PipelineError::ExternalTool`].
pub async fn run_tool(command: &ToolCommand, cwd: &Path) -> Result<ToolOutput> {
    log::debug!("running `{}` in {}", command, cwd.display());

    let output = Command::new(command.program())
        .args(command.args())
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| PipelineError::ExternalTool {
            tool: command.program().to_string(),
            reason: format!("failed to spawn: {}", e),
        })?;

    Ok(ToolOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
