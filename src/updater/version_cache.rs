//! Record of the last successful manifest fetch.
//!
//! Written by the orchestrator after every successful check so `launchpad status` can
//! report the latest known version without touching the network.

use crate::constants::VERSION_CACHE_FILE;
use crate::utils::fs::atomic_write_async;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCheckCache {
    pub latest_version: String,
    pub current_version: String,
    pub checked_at: DateTime<Utc>,
    pub update_available: bool,
}

impl VersionCheckCache {
    #[must_use]
    pub fn new(current_version: String, latest_version: String, update_available: bool) -> Self {
        Self {
            latest_version,
            current_version,
            checked_at: Utc::now(),
            update_available,
        }
    }

    /// Whether the record is younger than `max_age_secs`.
    #[must_use]
    pub fn is_fresh(&self, max_age_secs: u64) -> bool {
        let age = Utc::now() - self.checked_at;
        age.num_seconds() < i64::try_from(max_age_secs).unwrap_or(i64::MAX)
    }
}

/// Location of the cache file and its load/save operations.
#[derive(Debug, Clone)]
pub struct VersionCacheStore {
    path: PathBuf,
}

impl VersionCacheStore {
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(VERSION_CACHE_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache. A missing or unreadable file yields `None`.
    pub async fn load(&self) -> Result<Option<VersionCheckCache>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read version cache {}", self.path.display()))?;

        match serde_json::from_str(&content) {
            Ok(cache) => Ok(Some(cache)),
            Err(e) => {
                debug!("Ignoring corrupt version cache: {e}");
                Ok(None)
            }
        }
    }

    pub async fn save(&self, cache: &VersionCheckCache) -> Result<()> {
        let content = serde_json::to_vec_pretty(cache).context("Failed to serialize version cache")?;
        atomic_write_async(&self.path, content).await
    }

    pub async fn clear(&self) -> Result<()> {
        crate::utils::remove_file_if_exists(&self.path)
            .await
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(())
    }
}
