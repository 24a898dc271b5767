//! Error types for pipeline operations.
//!
//! The taxonomy distinguishes filesystem failures, manifest parse failures,
//! external tool failures, and finalizer rename conflicts. Everything is
//! fatal except the conditions the pipeline explicitly tolerates (absent
//! output directory on reset, already-finalized artifacts, best-effort docs).

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Filesystem operation failed (reset, copy, rename)
    #[error("filesystem error while {op} ({path}): {source}")]
    FileSystem {
        /// Operation being performed when the error occurred
        op: String,
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Manifest could not be opened or contains no version declaration
    #[error("manifest parse error in {path}: {reason}")]
    ManifestParse {
        /// Manifest file path
        path: PathBuf,
        /// Reason the version could not be extracted
        reason: String,
    },

    /// External tool exited nonzero, failed to spawn, or left no output
    #[error("external tool `{tool}` failed: {reason}")]
    ExternalTool {
        /// Tool program name
        tool: String,
        /// Reason for the failure
        reason: String,
    },

    /// Finalizer target name exists but belongs to a different artifact
    #[error("rename conflict: {target} already exists and does not match {artifact}")]
    RenameConflict {
        /// Source artifact being finalized
        artifact: PathBuf,
        /// Colliding versioned target name
        target: PathBuf,
    },

    /// Invalid CLI arguments or configuration file contents
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors without a more specific classification
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors from the configuration file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization errors from the run report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Extension trait for attaching operation/path context to IO results.
pub trait ErrorExt<T> {
    /// Converts an IO error into [`PipelineError::FileSystem`] with context.
    fn fs_context(self, op: &str, path: &Path) -> Result<T>;
}

impl<T> ErrorExt<T> for std::io::Result<T> {
    fn fs_context(self, op: &str, path: &Path) -> Result<T> {
        self.map_err(|source| PipelineError::FileSystem {
            op: op.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}
