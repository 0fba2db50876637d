//! Artifact cache for product downloads.
//!
//! Product executables are downloaded once into `<data_dir>/cache/` and reused
//! afterwards. `cache_metadata.json` records, per product id, which file was downloaded
//! from where and when; `clear` and `size` operate on the recorded files only.
//!
//! ```text
//! <data_dir>/cache/
//! ├── cache_metadata.json
//! ├── sandbox.exe
//! └── toolkit-setup.exe
//! ```

use crate::constants::{ARTIFACT_CACHE_DIR, CACHE_METADATA_FILE, DEFAULT_LOCK_TIMEOUT};
use crate::core::{LauncherError, Result};
use crate::updater::{DownloadProgress, Downloader, ProcessControl};
use crate::utils::fs::atomic_write_async;
use crate::utils::{FileLock, platform};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Metadata recorded for a cached download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
    pub downloaded_at: DateTime<Utc>,
}

/// Product id → entry.
pub type CacheMetadata = BTreeMap<String, CacheEntry>;

/// Result of [`ArtifactCache::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub path: PathBuf,
    /// `true` if the file was already present and nothing was downloaded.
    pub cached: bool,
}

/// A file found by [`ArtifactCache::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

pub struct ArtifactCache {
    dir: PathBuf,
    downloader: Downloader,
}

impl ArtifactCache {
    /// Cache rooted at `<data_dir>/cache`.
    #[must_use]
    pub fn new(data_dir: &Path, downloader: Downloader) -> Self {
        Self {
            dir: data_dir.join(ARTIFACT_CACHE_DIR),
            downloader,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(CACHE_METADATA_FILE)
    }

    fn file_path(&self, filename: &str) -> Result<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(filename)),
            _ => Err(LauncherError::Other {
                message: format!("invalid cache file name '{filename}': must be a plain file name"),
            }),
        }
    }

    /// Return the cached `filename`, downloading it from `url` first if absent.
    pub async fn fetch<F>(
        &self,
        product_id: &str,
        url: &str,
        filename: &str,
        on_progress: F,
    ) -> Result<CachedArtifact>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let path = self.file_path(filename)?;
        if path.is_file() {
            info!(filename, "already in cache");
            self.ensure_recorded(product_id, url, filename, &path).await?;
            return Ok(CachedArtifact {
                path,
                cached: true,
            });
        }

        info!(filename, url, "downloading to cache");
        self.downloader.download(url, &path, on_progress).await?;

        let _lock = self.lock().await?;
        let mut metadata = self.load_metadata().await?;
        metadata.insert(product_id.to_string(), new_entry(url, filename, &path, Utc::now()));
        self.save_metadata(&metadata).await?;

        Ok(CachedArtifact {
            path,
            cached: false,
        })
    }

    /// Record a file found on disk that the metadata does not know about, e.g. after
    /// `cache_metadata.json` was lost. Otherwise `clear` and `size` would never see it.
    async fn ensure_recorded(
        &self,
        product_id: &str,
        url: &str,
        filename: &str,
        path: &Path,
    ) -> Result<()> {
        let _lock = self.lock().await?;
        let mut metadata = self.load_metadata().await?;
        if metadata.get(product_id).is_some_and(|e| e.path == path) {
            return Ok(());
        }

        let downloaded_at = tokio::fs::metadata(path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map_or_else(Utc::now, DateTime::<Utc>::from);
        debug!(product = product_id, path = %path.display(), "recording untracked cached artifact");
        metadata.insert(product_id.to_string(), new_entry(url, filename, path, downloaded_at));
        self.save_metadata(&metadata).await
    }

    /// Size and modification time of `filename`, if cached.
    pub async fn lookup(&self, filename: &str) -> Result<Option<CacheLookup>> {
        let path = self.file_path(filename)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(CacheLookup {
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
                path,
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every recorded artifact and reset the metadata. Returns files removed.
    pub async fn clear(&self) -> Result<usize> {
        let _lock = self.lock().await?;
        let metadata = self.load_metadata().await?;

        let mut removed = 0;
        for (product, entry) in &metadata {
            if crate::utils::remove_file_if_exists(&entry.path).await? {
                debug!(product = %product, path = %entry.path.display(), "removed cached artifact");
                removed += 1;
            }
        }

        self.save_metadata(&CacheMetadata::new()).await?;
        info!(removed, "cache cleared");
        Ok(removed)
    }

    /// Total size in bytes of recorded artifacts still on disk.
    pub async fn size(&self) -> Result<u64> {
        let metadata = self.load_metadata().await?;
        let mut total = 0;
        for entry in metadata.values() {
            if let Ok(meta) = tokio::fs::metadata(&entry.path).await
                && meta.is_file()
            {
                total += meta.len();
            }
        }
        Ok(total)
    }

    /// Recorded entries.
    pub async fn entries(&self) -> Result<CacheMetadata> {
        self.load_metadata().await
    }

    async fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(&self.metadata_path(), DEFAULT_LOCK_TIMEOUT)
            .await
            .map_err(|e| LauncherError::IoError(std::io::Error::other(format!("{e:#}"))))
    }

    async fn load_metadata(&self) -> Result<CacheMetadata> {
        let path = self.metadata_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheMetadata::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(metadata) => Ok(metadata),
            Err(e) => {
                warn!(path = %path.display(), "ignoring corrupt cache metadata: {e}");
                Ok(CacheMetadata::new())
            }
        }
    }

    async fn save_metadata(&self, metadata: &CacheMetadata) -> Result<()> {
        let content = serde_json::to_vec_pretty(metadata).map_err(|e| LauncherError::Other {
            message: format!("failed to serialize cache metadata: {e}"),
        })?;
        atomic_write_async(&self.metadata_path(), content)
            .await
            .map_err(|e| LauncherError::IoError(std::io::Error::other(format!("{e:#}"))))
    }
}

fn new_entry(url: &str, filename: &str, path: &Path, downloaded_at: DateTime<Utc>) -> CacheEntry {
    CacheEntry {
        filename: filename.to_string(),
        path: path.to_path_buf(),
        url: url.to_string(),
        downloaded_at,
    }
}

/// Start an executable detached from this process.
///
/// Bare program names are looked up on `PATH`.
///
/// # Errors
///
/// [`LauncherError::IoError`] with kind `NotFound` if the executable does not exist, or
/// the spawn error otherwise.
pub fn launch(process: &dyn ProcessControl, path: &Path, args: &[String]) -> Result<()> {
    let program = platform::resolve_program(path);
    if !program.exists() {
        return Err(LauncherError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    info!(program = %program.display(), ?args, "launching");
    process.spawn_detached(&program, args)?;
    Ok(())
}

/// Human-readable size: `0 B`, `512 B`, `1.5 KB`, `2.25 MB`, ...
///
/// Base 1024, at most two decimals, trailing zeros dropped.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
