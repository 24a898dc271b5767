//! Documentation bundling stage (optional).

use super::process::{self, ToolOutput};
use crate::config::BuildConfiguration;
use crate::error::{PipelineError, Result};
use crate::util;

/// Runs the documentation generator and merges its output into the output
/// directory.
///
/// The generated site tree is copied into `<output_dir>/docs`; the optional
/// static resource tree is merged into the output directory root, where
/// colliding files are overwritten and unrelated files are left untouched.
///
/// A nonzero generator exit is returned in the [`ToolOutput`] for the driver
/// to judge (fatal by default, tolerated under `best_effort`). A generator
/// that exits zero but leaves no site tree is an external tool error.
pub async fn run(config: &BuildConfiguration) -> Result<ToolOutput> {
    log::info!("building documentation with `{}`", config.docs.command);
    let output = process::run_tool(&config.docs.command, &config.project_root).await?;
    if !output.success() {
        return Ok(output);
    }

    let site = &config.docs.site_dir;
    if !site.is_dir() {
        return Err(PipelineError::ExternalTool {
            tool: config.docs.command.program().to_string(),
            reason: format!("generated site not found at {}", site.display()),
        });
    }
    util::fs::merge_dir(site, &config.output_dir.join("docs")).await?;

    if let Some(resources) = &config.docs.resources {
        log::info!("merging static resources from {}", resources.display());
        util::fs::merge_dir(resources, &config.output_dir).await?;
    }

    Ok(output)
}
