//! Compiler invocation stage.

use super::process::{self, ToolOutput};
use crate::config::BuildConfiguration;
use crate::error::Result;

/// Runs the native build toolchain from the project root, capturing its
/// output and exit status.
///
/// A nonzero exit status marks the stage failed; the driver treats that as
/// pipeline-fatal, so no packaging stage runs against a broken build.
pub async fn run(config: &BuildConfiguration) -> Result<ToolOutput> {
    log::info!("compiling with `{}`", config.compile);
    process::run_tool(&config.compile, &config.project_root).await
}
