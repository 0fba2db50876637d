//! File system helpers: directory creation, atomic writes and best-effort removal.
//!
//! Every persisted file the launcher owns (skip marker, version cache, catalog, cache
//! metadata, config) is written through [`atomic_write`] so an interrupted write never
//! leaves a truncated file behind.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Ensure a directory exists, creating it and its parents if needed.
///
/// Fails if the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Write `content` to `path` atomically.
///
/// Content goes to a temporary file in the same directory, is synced to disk, and is
/// then renamed over the destination.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().context("Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Async variant of [`atomic_write`], run on the blocking pool.
pub async fn atomic_write_async(path: &Path, content: Vec<u8>) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || atomic_write(&path, &content))
        .await
        .context("Failed to join atomic write task")?
}

/// Remove a file if it exists. Returns whether a file was removed.
pub async fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove a file, logging instead of failing. Used for cleanup that must never block.
pub async fn remove_file_best_effort(path: &Path) {
    match remove_file_if_exists(path).await {
        Ok(true) => debug!(path = %path.display(), "removed file"),
        Ok(false) => {}
        Err(e) => debug!(path = %path.display(), error = %e, "failed to remove file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("deep").join("nested").join("atomic.txt");

        atomic_write(&file, b"nested content").unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "nested content");
    }

    #[test]
    fn test_atomic_write_overwrites() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("atomic.txt");

        atomic_write(&file, b"initial").unwrap();
        atomic_write(&file, b"updated").unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "updated");

        // no temp files left next to the target
        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_dir(&file).is_err());
    }

    #[tokio::test]
    async fn test_remove_file_if_exists() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("gone.bin");
        assert!(!remove_file_if_exists(&file).await.unwrap());

        tokio::fs::write(&file, b"x").await.unwrap();
        assert!(remove_file_if_exists(&file).await.unwrap());
        assert!(!file.exists());
    }
}
