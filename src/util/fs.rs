//! File system utilities for the pipeline.
//!
//! Provides idempotent directory removal, file copies with automatic parent
//! creation, and non-destructive directory merging.

use crate::error::{ErrorExt, PipelineError, Result};
use std::io;
use std::path::Path;
use tokio::fs;

/// Removes the directory and its contents if it exists.
///
/// A missing directory is not an error; any other removal failure is
/// surfaced as [`PipelineError::FileSystem`].
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(source) => Err(PipelineError::FileSystem {
            op: "removing directory".to_string(),
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(PipelineError::FileSystem {
            op: "copying file".to_string(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a file"),
        });
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", to)?;
    Ok(())
}

/// Recursively merges a directory tree into a destination directory.
///
/// Files are copied; destination files that collide are overwritten while
/// unrelated existing destination files are left untouched (non-destructive
/// union, not a wipe-and-replace). Creates the destination as needed.
pub async fn merge_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(PipelineError::FileSystem {
            op: "merging directory".to_string(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        });
    }

    // Clone paths for move into blocking closure
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Offload blocking traversal to the dedicated thread pool
    tokio::task::spawn_blocking(move || -> Result<()> {
        std::fs::create_dir_all(&to).fs_context("creating destination directory", &to)?;

        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry.map_err(|e| PipelineError::FileSystem {
                op: "walking source directory".to_string(),
                path: from.clone(),
                source: io::Error::other(e),
            })?;
            debug_assert!(entry.path().starts_with(&from));
            let rel_path = match entry.path().strip_prefix(&from) {
                Ok(p) => p,
                Err(_) => continue,
            };
            let dest_path = to.join(rel_path);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path)
                    .fs_context("creating directory", &dest_path)?;
            } else {
                // std::fs::copy overwrites an existing destination file
                std::fs::copy(entry.path(), &dest_path)
                    .fs_context("copying file", &dest_path)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| PipelineError::Io(io::Error::other(format!("directory merge task panicked: {}", e))))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn remove_dir_all_is_idempotent() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out");
        tokio::fs::create_dir(&target).await.unwrap();
        tokio::fs::write(target.join("stale.txt"), b"x").await.unwrap();

        remove_dir_all(&target).await.unwrap();
        assert!(!target.exists());

        // Second removal finds nothing and still succeeds
        remove_dir_all(&target).await.unwrap();
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn copy_file_creates_parents() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        tokio::fs::write(&src, b"payload").await.unwrap();

        let dst = dir.path().join("nested/deeper/a.txt");
        copy_file(&src, &dst).await.unwrap();
        assert_eq!(tokio::fs::read(&dst).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn copy_file_rejects_missing_source() {
        let dir = tempdir().unwrap();
        let err = copy_file(&dir.path().join("absent"), &dir.path().join("dst"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileSystem { .. }));
    }

    #[tokio::test]
    async fn merge_dir_overwrites_collisions_and_keeps_unrelated_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        tokio::fs::create_dir_all(src.join("sub")).await.unwrap();
        tokio::fs::create_dir_all(&dst).await.unwrap();

        tokio::fs::write(src.join("shared.txt"), b"new").await.unwrap();
        tokio::fs::write(src.join("sub/extra.txt"), b"extra").await.unwrap();
        tokio::fs::write(dst.join("shared.txt"), b"old").await.unwrap();
        tokio::fs::write(dst.join("unrelated.txt"), b"keep").await.unwrap();

        merge_dir(&src, &dst).await.unwrap();

        assert_eq!(tokio::fs::read(dst.join("shared.txt")).await.unwrap(), b"new");
        assert_eq!(tokio::fs::read(dst.join("unrelated.txt")).await.unwrap(), b"keep");
        assert_eq!(tokio::fs::read(dst.join("sub/extra.txt")).await.unwrap(), b"extra");
    }
}
