//! Launcher configuration file.
//!
//! # Location
//!
//! - `LAUNCHPAD_CONFIG_PATH` if set, or `--config PATH`
//! - Unix/macOS: `~/.launchpad/config.toml`
//! - Windows: `%LOCALAPPDATA%\launchpad\config.toml`
//!
//! A missing file means defaults.
//!
//! # Example
//!
//! ```toml
//! # Where the skip marker, caches and catalog live (defaults to the config directory)
//! data_dir = "~/.launchpad"
//!
//! [updater]
//! manifest_url = "https://raw.githubusercontent.com/acme/launcher/main/version.json"
//! auto_install = true
//!
//! [catalog]
//! catalog_url = "https://raw.githubusercontent.com/acme/launcher/main/loader_versions.json"
//! ```

use crate::config::updater::{CatalogConfig, UpdaterConfig};
use crate::utils::{atomic_write, resolve_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "LAUNCHPAD_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// State directory. Supports `~` and `$VAR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Pretend to run this version instead of the compiled-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,

    #[serde(default)]
    pub updater: UpdaterConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl LauncherConfig {
    /// Resolve which config file to use: explicit path, then `LAUNCHPAD_CONFIG_PATH`, then
    /// the platform default.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return resolve_path(&path);
        }
        Self::default_path()
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("launchpad")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".launchpad")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path).await
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || atomic_write(&target, content.as_bytes()))
            .await
            .context("Failed to join config write task")?
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read permissions for {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).await.with_context(|| {
                format!("Failed to set permissions on {}", path.display())
            })?;
        }

        Ok(())
    }

    /// State directory: `data_dir` if set, otherwise the directory holding the config file.
    pub fn data_dir(&self, config_path: &Path) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return resolve_path(dir);
        }
        match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
            _ => crate::utils::get_data_dir(),
        }
    }

    /// Directory holding per-product folders.
    pub fn products_dir(&self, data_dir: &Path) -> Result<PathBuf> {
        match &self.catalog.products_dir {
            Some(dir) => resolve_path(&dir.to_string_lossy()),
            None => Ok(data_dir.join("products")),
        }
    }

    /// Version this process reports as running.
    #[must_use]
    pub fn running_version(&self) -> String {
        self.current_version.clone().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    /// Config written by `launchpad config init`.
    #[must_use]
    pub fn init_example() -> Self {
        Self {
            data_dir: None,
            current_version: None,
            updater: UpdaterConfig {
                manifest_url: Some(
                    "https://raw.githubusercontent.com/YOUR_ORG/YOUR_REPO/main/version.json"
                        .to_string(),
                ),
                ..UpdaterConfig::default()
            },
            catalog: CatalogConfig {
                catalog_url: Some(
                    "https://raw.githubusercontent.com/YOUR_ORG/YOUR_REPO/main/loader_versions.json"
                        .to_string(),
                ),
                products_dir: None,
            },
        }
    }
}
