//! Stage and run result types.
//!
//! Every stage produces a [`StageResult`]; the driver collects them in
//! sequence order into a [`PipelineRun`], its sole output object.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Identifies one stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "variant", rename_all = "snake_case")]
pub enum StageKind {
    /// Output directory wipe and recreation.
    Resetting,
    /// Native compiler invocation.
    Compiling,
    /// Documentation generation and resource merge.
    DocsBundling,
    /// Installer generation for one variant.
    Packaging(String),
    /// Version extraction from the manifest.
    ExtractingVersion,
    /// Artifact renaming to the versioned form.
    Finalizing,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resetting => write!(f, "Resetting"),
            Self::Compiling => write!(f, "Compiling"),
            Self::DocsBundling => write!(f, "DocsBundling"),
            Self::Packaging(variant) => write!(f, "Packaging({})", variant),
            Self::ExtractingVersion => write!(f, "ExtractingVersion"),
            Self::Finalizing => write!(f, "Finalizing"),
        }
    }
}

/// Outcome of one executed stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    /// Which stage ran.
    pub stage: StageKind,
    /// Whether the stage succeeded.
    pub success: bool,
    /// Exit code of the spawned tool, when the stage ran one.
    pub exit_code: Option<i32>,
    /// Captured standard output of the spawned tool, or stage-produced text.
    pub stdout: String,
    /// Captured standard error of the spawned tool.
    pub stderr: String,
    /// Error description when the stage failed without tool output.
    pub error: Option<String>,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// How long the stage ran, in milliseconds.
    pub duration_ms: u64,
}

/// A packaged installer collected into the output directory, not yet
/// version-stamped.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Variant that produced the installer.
    pub variant: String,
    /// Canonical path in the output directory.
    pub path: PathBuf,
}

/// A version-stamped installer, ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedArtifact {
    /// Variant that produced the installer.
    pub variant: String,
    /// Versioned path in the output directory.
    pub path: PathBuf,
    /// Hex-encoded SHA-256 of the installer contents.
    pub sha256: String,
}

/// Overall run outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every stage succeeded; carries the finalized artifact list.
    Succeeded {
        /// Finalized artifacts in variant order.
        artifacts: Vec<FinalizedArtifact>,
    },
    /// A fatal stage failure aborted the run.
    FailedAt {
        /// The first failing stage.
        stage: StageKind,
    },
}

/// Ordered stage results plus the overall outcome.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    /// Stage results in execution order.
    pub stages: Vec<StageResult>,
    /// Overall outcome.
    pub outcome: RunOutcome,
}

impl PipelineRun {
    /// Builds a successful run result.
    pub fn succeeded(stages: Vec<StageResult>, artifacts: Vec<FinalizedArtifact>) -> Self {
        Self {
            stages,
            outcome: RunOutcome::Succeeded { artifacts },
        }
    }

    /// Builds a failed run result, naming the first failing stage. All
    /// previously collected stage results are preserved for diagnostics.
    pub fn failed(stages: Vec<StageResult>, stage: StageKind) -> Self {
        Self {
            stages,
            outcome: RunOutcome::FailedAt { stage },
        }
    }

    /// Whether the run completed all stages successfully.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded { .. })
    }

    /// The failing stage, if the run failed.
    pub fn failed_stage(&self) -> Option<&StageKind> {
        match &self.outcome {
            RunOutcome::FailedAt { stage } => Some(stage),
            RunOutcome::Succeeded { .. } => None,
        }
    }

    /// The finalized artifacts, if the run succeeded.
    pub fn artifacts(&self) -> &[FinalizedArtifact] {
        match &self.outcome {
            RunOutcome::Succeeded { artifacts } => artifacts,
            RunOutcome::FailedAt { .. } => &[],
        }
    }
}
