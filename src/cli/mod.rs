//! Command line interface for the pipeline.
//!
//! Resolves the configuration from file plus flag overrides, runs the
//! pipeline, prints the per-stage report, and maps the outcome to an exit
//! code.

mod args;

pub use args::Args;

use crate::config::{BuildConfiguration, ConfigOverrides};
use crate::error::{ErrorExt, Result};
use crate::pipeline::{Pipeline, PipelineRun, tools};
use std::path::Path;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let config = BuildConfiguration::load(&overrides_from(&args))?;
    tools::log_availability(&config);

    let pipeline = Pipeline::new(config);
    let run = pipeline.run().await;

    print_report(&run);
    if let Some(path) = &args.report_json {
        write_report(&run, path)?;
    }

    Ok(if run.is_success() { 0 } else { 1 })
}

fn overrides_from(args: &Args) -> ConfigOverrides {
    ConfigOverrides {
        project_root: args.project_root.clone(),
        config_file: args.config.clone(),
        output_dir: args.output_dir.clone(),
        docs: args.docs.then_some(true),
        variants: args.variant.clone(),
    }
}

/// Prints each stage's outcome and the terminal run status. On failure the
/// failing stage's captured tool output goes to stderr for diagnostics.
fn print_report(run: &PipelineRun) {
    for stage in &run.stages {
        let status = if stage.success { "ok" } else { "failed" };
        println!("{:<24} {} ({} ms)", stage.stage.to_string(), status, stage.duration_ms);
    }

    match run.failed_stage() {
        None => {
            for artifact in run.artifacts() {
                println!("  {} ({})", artifact.path.display(), artifact.sha256);
            }
            println!("pipeline succeeded");
        }
        Some(failed) => {
            if let Some(stage) = run.stages.iter().find(|s| &s.stage == failed) {
                if !stage.stdout.is_empty() {
                    eprintln!("--- {} stdout ---\n{}", stage.stage, stage.stdout.trim_end());
                }
                if !stage.stderr.is_empty() {
                    eprintln!("--- {} stderr ---\n{}", stage.stage, stage.stderr.trim_end());
                }
                if let Some(error) = &stage.error {
                    eprintln!("--- {} error ---\n{}", stage.stage, error);
                }
            }
            eprintln!("pipeline failed at stage: {}", failed);
        }
    }
}

/// Writes the serialized run report for downstream tooling.
fn write_report(run: &PipelineRun, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(run)?;
    std::fs::write(path, json).fs_context("writing run report", path)
}
