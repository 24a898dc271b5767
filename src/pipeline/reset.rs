//! Workspace reset stage.

use crate::error::{ErrorExt, Result};
use crate::util;
use std::path::Path;

/// Clears and recreates the output directory.
///
/// Removal of an absent directory is a silent no-op; any other removal
/// failure (permissions, in-use handle) is fatal and surfaces as a
/// filesystem error. Running twice in succession yields the same
/// empty-directory end state both times.
pub async fn clear_output_dir(output_dir: &Path) -> Result<()> {
    log::info!("clearing output directory {}", output_dir.display());
    util::fs::remove_dir_all(output_dir).await?;
    tokio::fs::create_dir_all(output_dir)
        .await
        .fs_context("creating output directory", output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn wipes_leftover_state() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("windows_builds");
        tokio::fs::create_dir_all(out.join("old")).await.unwrap();
        tokio::fs::write(out.join("old/artifact.exe"), b"stale").await.unwrap();

        clear_output_dir(&out).await.unwrap();

        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn reset_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("windows_builds");

        clear_output_dir(&out).await.unwrap();
        clear_output_dir(&out).await.unwrap();

        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }
}
