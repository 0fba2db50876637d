//! Global constants used throughout the launchpad codebase.
//!
//! Timeouts, delays, file names and other values that are used across multiple
//! modules. Values that users may want to tune have a config counterpart in
//! [`crate::config::UpdaterConfig`]; the constants here are its defaults.

use std::time::Duration;

/// Maximum number of HTTP redirects followed for a single request.
///
/// Applies to both manifest fetches and artifact downloads. Exceeding it fails with
/// [`crate::core::LauncherError::RedirectLoopError`].
pub const MAX_REDIRECTS: usize = 5;

/// Delay between process start and the first scheduled update check.
///
/// Gives the host application time to settle before the first network request.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(3);

/// Interval between recurring update checks (30 minutes).
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Time the installer is given to finish before the application is relaunched.
///
/// Installers invoked in silent mode give no completion signal, so a fixed delay is used.
pub const DEFAULT_INSTALL_SETTLE: Duration = Duration::from_secs(5);

/// Delay before the process exits after a successful install, leaving room for final UI feedback.
pub const DEFAULT_EXIT_DELAY: Duration = Duration::from_millis(500);

/// Default timeout for a single HTTP request (connect + headers).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Silent-install flag passed to the installer artifact (NSIS convention).
pub const DEFAULT_SILENT_INSTALL_FLAG: &str = "/S";

/// File holding the skip marker (the version of the last attempted install).
pub const SKIP_MARKER_FILE: &str = "skip_version.txt";

/// File holding the last successful manifest fetch.
pub const VERSION_CACHE_FILE: &str = "version_cache.json";

/// File name of the local product catalog.
pub const CATALOG_FILE: &str = "loader_versions.json";

/// Directory (under the data dir) where downloaded artifacts are cached.
pub const ARTIFACT_CACHE_DIR: &str = "cache";

/// Metadata file inside the artifact cache directory.
pub const CACHE_METADATA_FILE: &str = "cache_metadata.json";

/// File name used for the downloaded self-update installer in the temp directory.
pub const UPDATE_ARTIFACT_NAME: &str = if cfg!(windows) {
    "launchpad-update.exe"
} else {
    "launchpad-update"
};

/// Maximum backoff delay when waiting for an advisory file lock (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Default timeout for advisory file lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);
