//! Pipeline driver and stages.
//!
//! The driver owns the fixed stage order, executes each stage, collects its
//! [`StageResult`], and decides whether to proceed. The state machine is
//! `Pending → Resetting → Compiling → (DocsBundling) → Packaging[v₁…vₙ] →
//! ExtractingVersion → Finalizing → Succeeded`, with any stage able to
//! transition directly to `Failed(stage)`.
//!
//! Fail-fast: the first fatal stage failure aborts all subsequent stages.
//! No stage retries, and nothing is rolled back; a subsequent run always
//! starts from the workspace reset and is therefore self-healing.

mod compile;
mod docs;
mod finalize;
mod package;
pub mod process;
mod reset;
mod result;
pub mod tools;

pub use process::ToolOutput;
pub use result::{Artifact, FinalizedArtifact, PipelineRun, RunOutcome, StageKind, StageResult};

use crate::config::BuildConfiguration;
use crate::error::{PipelineError, Result};
use crate::manifest;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Sequences all stages and decides the overall run outcome.
pub struct Pipeline {
    config: BuildConfiguration,
}

impl Pipeline {
    /// Creates a pipeline for the given configuration.
    pub fn new(config: BuildConfiguration) -> Self {
        Self { config }
    }

    /// Returns the run configuration.
    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    /// Executes the full pipeline and returns the run record.
    ///
    /// Never returns an error: failures are folded into the returned
    /// [`PipelineRun`], which preserves every collected stage result and
    /// names the first failing stage.
    pub async fn run(&self) -> PipelineRun {
        let config = &self.config;
        let mut stages: Vec<StageResult> = Vec::new();

        // Resetting
        let clock = StageClock::start();
        let result = reset::clear_output_dir(&config.output_dir).await;
        if !push_stage(&mut stages, clock.finish_unit(StageKind::Resetting, &result)) {
            return PipelineRun::failed(stages, StageKind::Resetting);
        }

        // Compiling: fatal on nonzero exit, so no packaging runs against a
        // broken build
        let clock = StageClock::start();
        let result = compile::run(config).await;
        if !push_stage(&mut stages, clock.finish_tool(StageKind::Compiling, &result)) {
            return PipelineRun::failed(stages, StageKind::Compiling);
        }

        // DocsBundling (optional)
        if config.docs.enabled {
            let clock = StageClock::start();
            let result = docs::run(config).await;
            let tolerated = config.docs.best_effort && is_generator_failure(&result);
            if !push_stage(&mut stages, clock.finish_tool(StageKind::DocsBundling, &result)) {
                if !tolerated {
                    return PipelineRun::failed(stages, StageKind::DocsBundling);
                }
                log::warn!("documentation bundling failed; continuing (best effort)");
            }
        }

        // Packaging, once per variant, in configured order
        let mut artifacts: Vec<Artifact> = Vec::new();
        for variant in &config.variants {
            let stage = StageKind::Packaging(variant.name.clone());
            let clock = StageClock::start();
            let (tool_result, artifact) = match package::run_variant(config, variant).await {
                Ok((output, artifact)) => (Ok(output), artifact),
                Err(e) => (Err(e), None),
            };
            if !push_stage(&mut stages, clock.finish_tool(stage.clone(), &tool_result)) {
                return PipelineRun::failed(stages, stage);
            }
            if let Some(artifact) = artifact {
                artifacts.push(artifact);
            }
        }

        // ExtractingVersion: only after compilation, which could in
        // principle regenerate manifest metadata
        let clock = StageClock::start();
        let version_result = manifest::extract_version(&config.manifest);
        let stage = clock.finish_value(StageKind::ExtractingVersion, &version_result);
        let version = match version_result {
            Ok(version) => {
                push_stage(&mut stages, stage);
                version
            }
            Err(_) => {
                push_stage(&mut stages, stage);
                return PipelineRun::failed(stages, StageKind::ExtractingVersion);
            }
        };
        log::info!("extracted version {}", version);

        // Finalizing
        let clock = StageClock::start();
        let finalize_result = finalize::finalize(&artifacts, &version).await;
        let finalized = match &finalize_result {
            Ok(finalized) => finalized.clone(),
            Err(_) => Vec::new(),
        };
        if !push_stage(
            &mut stages,
            clock.finish_unit(StageKind::Finalizing, &finalize_result.map(|_| ())),
        ) {
            return PipelineRun::failed(stages, StageKind::Finalizing);
        }

        PipelineRun::succeeded(stages, finalized)
    }
}

/// Appends the stage result and reports whether the run may proceed.
fn push_stage(stages: &mut Vec<StageResult>, stage: StageResult) -> bool {
    if !stage.success {
        log::error!("stage {} failed", stage.stage);
    }
    let success = stage.success;
    stages.push(stage);
    success
}

/// Whether a docs-stage outcome is a generator failure (tolerated under
/// best-effort) rather than a filesystem failure (always fatal).
fn is_generator_failure(result: &Result<ToolOutput>) -> bool {
    match result {
        Ok(output) => !output.success(),
        Err(PipelineError::ExternalTool { .. }) => true,
        Err(_) => false,
    }
}

/// Captures a stage's start time and builds its [`StageResult`].
struct StageClock {
    started_at: DateTime<Utc>,
    start: Instant,
}

impl StageClock {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    fn finish_unit(self, stage: StageKind, result: &Result<()>) -> StageResult {
        StageResult {
            stage,
            success: result.is_ok(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            error: result.as_ref().err().map(|e| e.to_string()),
            started_at: self.started_at,
            duration_ms: self.start.elapsed().as_millis() as u64,
        }
    }

    fn finish_value(self, stage: StageKind, result: &Result<String>) -> StageResult {
        StageResult {
            stage,
            success: result.is_ok(),
            exit_code: None,
            stdout: result.as_ref().cloned().unwrap_or_default(),
            stderr: String::new(),
            error: result.as_ref().err().map(|e| e.to_string()),
            started_at: self.started_at,
            duration_ms: self.start.elapsed().as_millis() as u64,
        }
    }

    fn finish_tool(self, stage: StageKind, result: &Result<ToolOutput>) -> StageResult {
        match result {
            Ok(output) => StageResult {
                stage,
                success: output.success(),
                exit_code: output.exit_code,
                stdout: output.stdout.clone(),
                stderr: output.stderr.clone(),
                error: None,
                started_at: self.started_at,
                duration_ms: self.start.elapsed().as_millis() as u64,
            },
            Err(e) => StageResult {
                stage,
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(e.to_string()),
                started_at: self.started_at,
                duration_ms: self.start.elapsed().as_millis() as u64,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, ToolCommand};
    use tempfile::tempdir;

    /// Builds a runnable configuration over a scratch project tree with fake
    /// tools: the compiler is a no-op, each variant's script directory holds
    /// its script, and the packager pre-produces the installer executable.
    async fn fake_project(root: &std::path::Path, variants: &[&str]) -> BuildConfiguration {
        tokio::fs::write(root.join("Cargo.toml"), "version = \"0.1.9\"\n")
            .await
            .unwrap();

        let mut config = BuildConfiguration::load(&ConfigOverrides {
            project_root: Some(root.to_path_buf()),
            ..Default::default()
        })
        .unwrap();
        config.compile = ToolCommand::new(["sh", "-c", "true"]);

        config.variants = Vec::new();
        for name in variants {
            let script_dir = root.join("installer").join(name);
            tokio::fs::create_dir_all(&script_dir).await.unwrap();
            tokio::fs::write(script_dir.join("installer.nsi"), b"; script")
                .await
                .unwrap();
            let cap = format!("{}{}", name[..1].to_uppercase(), &name[1..]);
            let produced = format!("{}Setup.exe", cap);
            // Tells the fake generator what to emit in this directory
            tokio::fs::write(script_dir.join("expected_name"), &produced)
                .await
                .unwrap();
            config.variants.push(crate::config::VariantConfig {
                name: name.to_string(),
                script_dir,
                script: "installer.nsi".to_string(),
                produces: produced.clone(),
                artifact: produced,
            });
        }
        // Fake generator: writes the installer name this variant expects
        config.packager = ToolCommand::new([
            "sh",
            "-c",
            "printf \"payload-$(basename \"$(pwd)\")\" > \"$(cat expected_name)\"",
        ]);
        config
    }

    fn stage_index(run: &PipelineRun, stage: &StageKind) -> Option<usize> {
        run.stages.iter().position(|s| &s.stage == stage)
    }

    #[tokio::test]
    async fn full_run_finalizes_each_variant_independently() {
        let dir = tempdir().unwrap();
        let config = fake_project(dir.path(), &["user", "admin"]).await;
        let output_dir = config.output_dir.clone();

        let run = Pipeline::new(config).run().await;
        assert!(run.is_success(), "run failed: {:?}", run.outcome);

        let artifacts = run.artifacts();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, output_dir.join("UserSetup_v0.1.9.exe"));
        assert_eq!(artifacts[1].path, output_dir.join("AdminSetup_v0.1.9.exe"));
        assert!(artifacts[0].path.is_file());
        assert!(artifacts[1].path.is_file());
        assert_ne!(artifacts[0].sha256, artifacts[1].sha256);
    }

    #[tokio::test]
    async fn stage_ordering_invariants_hold() {
        let dir = tempdir().unwrap();
        let config = fake_project(dir.path(), &["user"]).await;

        let run = Pipeline::new(config).run().await;
        assert!(run.is_success());

        let compile = stage_index(&run, &StageKind::Compiling).unwrap();
        let packaging = stage_index(&run, &StageKind::Packaging("user".into())).unwrap();
        let extract = stage_index(&run, &StageKind::ExtractingVersion).unwrap();
        let finalize = stage_index(&run, &StageKind::Finalizing).unwrap();

        assert!(compile < packaging);
        assert!(extract > compile);
        assert_eq!(finalize, run.stages.len() - 1);

        // Extraction captures the version it read
        assert_eq!(run.stages[extract].stdout, "0.1.9");
    }

    #[tokio::test]
    async fn compile_failure_aborts_before_any_packaging() {
        let dir = tempdir().unwrap();
        let mut config = fake_project(dir.path(), &["user"]).await;
        config.compile = ToolCommand::new(["sh", "-c", "echo nope >&2; exit 1"]);

        let run = Pipeline::new(config).run().await;
        assert_eq!(run.failed_stage(), Some(&StageKind::Compiling));
        assert!(
            !run.stages
                .iter()
                .any(|s| matches!(s.stage, StageKind::Packaging(_)))
        );

        // Captured tool output survives for diagnostics
        let compile = &run.stages[stage_index(&run, &StageKind::Compiling).unwrap()];
        assert_eq!(compile.exit_code, Some(1));
        assert!(compile.stderr.contains("nope"));
    }

    #[tokio::test]
    async fn docs_failure_is_fatal_by_default() {
        let dir = tempdir().unwrap();
        let mut config = fake_project(dir.path(), &["user"]).await;
        config.docs.enabled = true;
        config.docs.command = ToolCommand::new(["sh", "-c", "exit 1"]);

        let run = Pipeline::new(config).run().await;
        assert_eq!(run.failed_stage(), Some(&StageKind::DocsBundling));
        assert!(
            !run.stages
                .iter()
                .any(|s| matches!(s.stage, StageKind::Packaging(_)))
        );
    }

    #[tokio::test]
    async fn best_effort_docs_failure_does_not_stop_the_run() {
        let dir = tempdir().unwrap();
        let mut config = fake_project(dir.path(), &["user"]).await;
        config.docs.enabled = true;
        config.docs.best_effort = true;
        config.docs.command = ToolCommand::new(["sh", "-c", "exit 1"]);

        let run = Pipeline::new(config).run().await;
        assert!(run.is_success());

        let docs = &run.stages[stage_index(&run, &StageKind::DocsBundling).unwrap()];
        assert!(!docs.success);
        assert_eq!(run.artifacts().len(), 1);
    }

    #[tokio::test]
    async fn missing_manifest_fails_at_version_extraction() {
        let dir = tempdir().unwrap();
        let mut config = fake_project(dir.path(), &["user"]).await;
        config.manifest = dir.path().join("absent.toml");

        let run = Pipeline::new(config).run().await;
        assert_eq!(run.failed_stage(), Some(&StageKind::ExtractingVersion));
        // Packaging already happened; its results are preserved
        assert!(
            run.stages
                .iter()
                .any(|s| matches!(s.stage, StageKind::Packaging(_)))
        );
    }

    #[tokio::test]
    async fn run_report_serializes_with_stages_in_order() {
        let dir = tempdir().unwrap();
        let config = fake_project(dir.path(), &["user"]).await;

        let run = Pipeline::new(config).run().await;
        let json = serde_json::to_value(&run).unwrap();

        let kinds: Vec<&str> = json["stages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["stage"]["kind"].as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            [
                "resetting",
                "compiling",
                "packaging",
                "extracting_version",
                "finalizing"
            ]
        );
        assert_eq!(json["outcome"]["status"], "succeeded");
    }
}
