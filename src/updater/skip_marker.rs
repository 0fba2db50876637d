//! Persisted skip marker: the version a previous install attempt targeted.
//!
//! Stored as a plain text file containing exactly the version string. An absent or
//! blank file means "no marker". Writes are atomic and, together with read-modify-write
//! sequences, happen under an exclusive [`FileLock`] because the CLI and a running
//! scheduler are separate processes.

use crate::constants::{DEFAULT_LOCK_TIMEOUT, SKIP_MARKER_FILE};
use crate::core::{LauncherError, Result};
use crate::utils::fs::atomic_write_async;
use crate::utils::{FileLock, remove_file_if_exists};
use crate::version::DottedVersion;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads and writes the skip marker file.
#[derive(Debug, Clone)]
pub struct SkipMarkerStore {
    path: PathBuf,
}

impl SkipMarkerStore {
    /// Store for `<data_dir>/skip_version.txt`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SKIP_MARKER_FILE))
    }

    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the exclusive lock for a read-modify-write sequence.
    pub async fn lock(&self) -> Result<LockedSkipMarker<'_>> {
        let lock = FileLock::acquire(&self.path, DEFAULT_LOCK_TIMEOUT)
            .await
            .map_err(|e| LauncherError::IoError(std::io::Error::other(format!("{e:#}"))))?;
        Ok(LockedSkipMarker {
            store: self,
            _lock: lock,
        })
    }

    /// Current marker, if any. Does not take the lock; writes are atomic.
    pub async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let value = content.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set the marker to `version`.
    pub async fn set(&self, version: &str) -> Result<()> {
        self.lock().await?.set(version).await
    }

    /// Remove the marker. Returns whether one was present.
    pub async fn clear(&self) -> Result<bool> {
        self.lock().await?.clear().await
    }

    async fn write_unlocked(&self, version: &str) -> Result<()> {
        // stored markers always parse as versions
        let version = DottedVersion::parse(version)?.as_str().to_string();
        atomic_write_async(&self.path, version.as_bytes().to_vec())
            .await
            .map_err(|e| LauncherError::IoError(std::io::Error::other(format!("{e:#}"))))?;
        info!(version = %version, path = %self.path.display(), "skip marker set");
        Ok(())
    }

    async fn remove_unlocked(&self) -> Result<bool> {
        let removed = remove_file_if_exists(&self.path).await?;
        if removed {
            info!(path = %self.path.display(), "skip marker cleared");
        } else {
            debug!(path = %self.path.display(), "no skip marker to clear");
        }
        Ok(removed)
    }
}

/// Skip marker with the exclusive lock held. Released on drop.
pub struct LockedSkipMarker<'a> {
    store: &'a SkipMarkerStore,
    _lock: FileLock,
}

impl LockedSkipMarker<'_> {
    pub async fn read(&self) -> Result<Option<String>> {
        self.store.read().await
    }

    pub async fn set(&self, version: &str) -> Result<()> {
        self.store.write_unlocked(version).await
    }

    pub async fn clear(&self) -> Result<bool> {
        self.store.remove_unlocked().await
    }
}
