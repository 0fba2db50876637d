//! `[updater]` and `[catalog]` configuration sections.

use crate::constants::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_EXIT_DELAY, DEFAULT_INSTALL_SETTLE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SILENT_INSTALL_FLAG, DEFAULT_STARTUP_DELAY, MAX_REDIRECTS,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Self-update behaviour.
///
/// ```toml
/// [updater]
/// manifest_url = "https://raw.githubusercontent.com/acme/launcher/main/version.json"
/// check_interval_secs = 1800
/// auto_install = false
/// install_args = ["/S"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Remote version manifest. Checks fail with a config error when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,

    /// Run a check shortly after `launchpad run` starts.
    #[serde(default = "default_true")]
    pub check_on_startup: bool,

    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,

    /// Seconds between recurring checks. `0` disables the recurring timer.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Download and install as soon as a check finds an update.
    #[serde(default)]
    pub auto_install: bool,

    /// Verify the manifest's `sha256` (when present) before installing.
    #[serde(default = "default_true")]
    pub verify_checksum: bool,

    /// Arguments passed to the installer artifact.
    #[serde(default = "default_install_args")]
    pub install_args: Vec<String>,

    #[serde(default = "default_install_settle_secs")]
    pub install_settle_secs: u64,

    #[serde(default = "default_exit_delay_ms")]
    pub exit_delay_ms: u64,

    /// Executable relaunched after install. Defaults to the running executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_executable: Option<PathBuf>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            manifest_url: None,
            check_on_startup: true,
            startup_delay_secs: default_startup_delay_secs(),
            check_interval_secs: default_check_interval_secs(),
            auto_install: false,
            verify_checksum: true,
            install_args: default_install_args(),
            install_settle_secs: default_install_settle_secs(),
            exit_delay_ms: default_exit_delay_ms(),
            primary_executable: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl UpdaterConfig {
    #[must_use]
    pub const fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    /// Recurring interval, `None` when disabled.
    #[must_use]
    pub const fn check_interval(&self) -> Option<Duration> {
        if self.check_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.check_interval_secs))
        }
    }

    #[must_use]
    pub const fn install_settle(&self) -> Duration {
        Duration::from_secs(self.install_settle_secs)
    }

    #[must_use]
    pub const fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Product catalog sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Remote `loader_versions.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_url: Option<String>,

    /// Directory holding one folder per product. Defaults to `<data_dir>/products`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_dir: Option<PathBuf>,
}

const fn default_true() -> bool {
    true
}

const fn default_startup_delay_secs() -> u64 {
    DEFAULT_STARTUP_DELAY.as_secs()
}

const fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL.as_secs()
}

fn default_install_args() -> Vec<String> {
    vec![DEFAULT_SILENT_INSTALL_FLAG.to_string()]
}

const fn default_install_settle_secs() -> u64 {
    DEFAULT_INSTALL_SETTLE.as_secs()
}

const fn default_exit_delay_ms() -> u64 {
    DEFAULT_EXIT_DELAY.as_millis() as u64
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

const fn default_max_redirects() -> usize {
    MAX_REDIRECTS
}
