//! Local product catalog (`loader_versions.json`).
//!
//! The catalog maps a product id to its metadata, using the PascalCase keys of the
//! published file:
//!
//! ```json
//! {
//!   "sandbox": {
//!     "DisplayName": "Sandbox",
//!     "Category": "Tools",
//!     "Icon": "🧰",
//!     "Version": "3.1.0",
//!     "DownloadUrl": "https://example.com/sandbox.exe",
//!     "ExecutablePath": "C:\\Launchpad\\sandbox\\sandbox.exe",
//!     "OriginalFileName": "sandbox.exe",
//!     "AssociatedExecutables": ["sandbox-helper.exe"],
//!     "LastCheck": "2024-05-01T12:00:00Z"
//!   }
//! }
//! ```
//!
//! [`CatalogStore`] keeps a local copy in the data directory, syncs it from a remote URL
//! and reports which products are out of date. Product versions are compared as plain
//! strings: any difference means "outdated".

use crate::constants::CATALOG_FILE;
use crate::core::{LauncherError, Result};
use crate::updater::ManifestFetcher;
use crate::utils::fs::atomic_write_async;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// One product as stored in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated_executables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<String>,
    /// Keys this version of the launcher does not know about, kept on rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Product id → entry.
pub type Catalog = BTreeMap<String, ProductEntry>;

/// Flattened view of a product for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub version: String,
    pub download_url: Option<String>,
    pub exe_path: Option<String>,
    pub original_file_name: Option<String>,
    pub executables: Vec<String>,
    pub last_check: Option<String>,
    pub is_downloaded: bool,
}

impl ProductSummary {
    fn from_entry(id: &str, entry: &ProductEntry) -> Self {
        Self {
            id: id.to_string(),
            name: entry.display_name.clone().unwrap_or_else(|| id.to_string()),
            category: entry.category.clone().unwrap_or_else(|| "Unknown".to_string()),
            icon: entry.icon.clone().unwrap_or_else(|| "🎮".to_string()),
            version: entry.version.clone(),
            download_url: entry.download_url.clone(),
            exe_path: entry.executable_path.clone(),
            original_file_name: entry.original_file_name.clone(),
            executables: entry.associated_executables.clone(),
            last_check: entry.last_check.clone(),
            is_downloaded: entry.executable_path.as_deref().is_some_and(|p| Path::new(p).exists()),
        }
    }
}

/// A product whose remote version differs from the local one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub id: String,
    pub name: String,
    /// `None` when the product is not in the local catalog.
    pub old_version: Option<String>,
    pub new_version: String,
}

/// Result of comparing the remote catalog with the local one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdatedReport {
    /// No local catalog exists, so everything is considered outdated.
    pub local_missing: bool,
    pub updates: Vec<ProductUpdate>,
}

impl OutdatedReport {
    #[must_use]
    pub fn updates_available(&self) -> bool {
        self.local_missing || !self.updates.is_empty()
    }
}

/// Local catalog file plus the product folders next to it.
pub struct CatalogStore {
    path: PathBuf,
    products_dir: PathBuf,
    fetcher: ManifestFetcher,
}

impl CatalogStore {
    #[must_use]
    pub fn new(data_dir: &Path, products_dir: PathBuf, fetcher: ManifestFetcher) -> Self {
        Self {
            path: data_dir.join(CATALOG_FILE),
            products_dir,
            fetcher,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn products_dir(&self) -> &Path {
        &self.products_dir
    }

    /// Read the local catalog. `None` if it does not exist yet.
    pub async fn load(&self) -> Result<Option<Catalog>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map(Some).map_err(|e| LauncherError::CatalogError {
            message: format!("{} is not a valid catalog: {e}", self.path.display()),
        })
    }

    /// All products, syncing from `remote_url` first when no local catalog exists.
    pub async fn list(&self, remote_url: Option<&str>) -> Result<Vec<ProductSummary>> {
        let catalog = match self.load().await? {
            Some(catalog) => catalog,
            None => {
                let url = remote_url.ok_or_else(|| LauncherError::CatalogError {
                    message: "no local catalog and catalog.catalog_url is not set".to_string(),
                })?;
                info!("Local catalog not found, syncing from remote");
                self.sync(url).await?
            }
        };

        Ok(catalog.iter().map(|(id, entry)| ProductSummary::from_entry(id, entry)).collect())
    }

    /// Replace the local catalog with the remote one.
    ///
    /// Every product gets `LastCheck` set to now, and a folder is created for each
    /// product under the products directory.
    pub async fn sync(&self, remote_url: &str) -> Result<Catalog> {
        info!(url = remote_url, "Syncing product catalog");
        let mut catalog: Catalog = self.fetcher.fetch_json(remote_url, "product catalog").await?;
        if let Some(bad) = catalog.keys().find(|id| !is_plain_id(id)) {
            return Err(LauncherError::CatalogError {
                message: format!("invalid product id '{bad}': must be a plain folder name"),
            });
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        for entry in catalog.values_mut() {
            entry.last_check = Some(now.clone());
        }

        let content = serde_json::to_vec_pretty(&catalog).map_err(|e| LauncherError::CatalogError {
            message: format!("failed to serialize catalog: {e}"),
        })?;
        atomic_write_async(&self.path, content).await.map_err(|e| LauncherError::CatalogError {
            message: format!("{e:#}"),
        })?;

        for id in catalog.keys() {
            let folder = self.products_dir.join(id);
            if !folder.exists() {
                tokio::fs::create_dir_all(&folder).await?;
                debug!(product = %id, folder = %folder.display(), "created product folder");
            }
        }

        info!(products = catalog.len(), "Product catalog synced");
        Ok(catalog)
    }

    /// Compare the remote catalog with the local one.
    pub async fn outdated(&self, remote_url: &str) -> Result<OutdatedReport> {
        let remote: Catalog = self.fetcher.fetch_json(remote_url, "product catalog").await?;

        let Some(local) = self.load().await? else {
            return Ok(OutdatedReport {
                local_missing: true,
                updates: Vec::new(),
            });
        };

        Ok(OutdatedReport {
            local_missing: false,
            updates: diff(&local, &remote),
        })
    }
}

/// Product ids become folder names, so only a single normal path component is allowed.
fn is_plain_id(id: &str) -> bool {
    let mut components = Path::new(id).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Products that are new in `remote` or whose `Version` string changed.
#[must_use]
pub fn diff(local: &Catalog, remote: &Catalog) -> Vec<ProductUpdate> {
    remote
        .iter()
        .filter_map(|(id, remote_entry)| {
            let local_entry = local.get(id);
            if local_entry.is_some_and(|l| l.version == remote_entry.version) {
                return None;
            }
            Some(ProductUpdate {
                id: id.clone(),
                name: remote_entry.display_name.clone().unwrap_or_else(|| id.clone()),
                old_version: local_entry.map(|l| l.version.clone()),
                new_version: remote_entry.version.clone(),
            })
        })
        .collect()
}
