//! Advisory file locking for single-writer state files.
//!
//! The skip marker and the artifact cache metadata are read-modify-written by both
//! the long-running scheduler (`launchpad run`) and one-shot CLI commands. An exclusive
//! lock on a sibling `.lock` file serialises those updates across processes. The lock
//! is released when the [`FileLock`] is dropped.

use crate::utils::backoff::exponential_backoff_with_delay;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Held exclusive lock on `<target>.lock`.
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Lock path used to guard `target`.
    #[must_use]
    pub fn lock_path_for(target: &Path) -> PathBuf {
        let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        target.with_file_name(name)
    }

    /// Acquire an exclusive lock guarding `target`, waiting up to `timeout`.
    ///
    /// Polls with exponential backoff so the tokio runtime is never blocked.
    pub async fn acquire(target: &Path, timeout: Duration) -> Result<Self> {
        let path = Self::lock_path_for(target);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create lock directory {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        let start = Instant::now();
        let mut attempt = 0;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to lock {}", path.display()));
                }
            }
            if start.elapsed() >= timeout {
                anyhow::bail!(
                    "Timed out after {:?} waiting for lock {}",
                    timeout,
                    path.display()
                );
            }
            attempt = exponential_backoff_with_delay(attempt).await;
        }

        Ok(Self {
            file,
            path,
        })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
