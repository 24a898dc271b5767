//! Artifact finalizer stage.
//!
//! Pure filesystem renames; no recompilation, no tool re-invocation.

use super::result::{Artifact, FinalizedArtifact};
use crate::error::{ErrorExt, PipelineError, Result};
use crate::util;
use std::path::{Path, PathBuf};

/// Computes the versioned form of an artifact file name:
/// `<stem>_v<version><extension>`.
pub fn versioned_name(file_name: &str, version: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_v{}.{}", stem, version, ext),
        _ => format!("{}_v{}", file_name, version),
    }
}

/// Renames each collected artifact in the output directory to embed the
/// extracted version string, returning the finalized set with checksums.
///
/// Idempotent per artifact: a target that already exists and corresponds to
/// this artifact (source gone, or byte-identical contents) is skipped
/// without error. A target belonging to a different artifact is a
/// [`PipelineError::RenameConflict`].
pub async fn finalize(artifacts: &[Artifact], version: &str) -> Result<Vec<FinalizedArtifact>> {
    let mut finalized = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let target = finalize_one(&artifact.path, version).await?;
        let sha256 = util::checksum::sha256_file(&target).await?;
        log::info!("finalized {} (sha256 {})", target.display(), sha256);
        finalized.push(FinalizedArtifact {
            variant: artifact.variant.clone(),
            path: target,
            sha256,
        });
    }
    Ok(finalized)
}

async fn finalize_one(source: &Path, version: &str) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PipelineError::FileSystem {
            op: "resolving artifact name".to_string(),
            path: source.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
        })?;
    let target = source.with_file_name(versioned_name(file_name, version));

    match (source.is_file(), target.is_file()) {
        // Normal path: stamp the version into the name
        (true, false) => {
            tokio::fs::rename(source, &target)
                .await
                .fs_context("renaming artifact", source)?;
        }
        // Already finalized by an earlier invocation
        (false, true) => {
            log::debug!("{} already finalized, skipping", target.display());
        }
        (true, true) => {
            let src_sum = util::checksum::sha256_file(source).await?;
            let dst_sum = util::checksum::sha256_file(&target).await?;
            if src_sum != dst_sum {
                return Err(PipelineError::RenameConflict {
                    artifact: source.to_path_buf(),
                    target,
                });
            }
            log::debug!("{} already finalized, skipping", target.display());
        }
        (false, false) => {
            return Err(PipelineError::FileSystem {
                op: "locating artifact".to_string(),
                path: source.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "artifact missing"),
            });
        }
    }

    Ok(target)
}
