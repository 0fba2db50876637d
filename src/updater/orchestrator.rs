//! The update orchestrator.
//!
//! Owns one check/install lifecycle: fetches the manifest, applies the loop guard,
//! emits [`UpdateEvent`]s, and runs download + install. Every failure inside a cycle is
//! caught here, logged, emitted as an `error` event and returned as a structured
//! result; nothing propagates out of [`UpdateOrchestrator::check`] or
//! [`UpdateOrchestrator::install`].

use crate::config::UpdaterConfig;
use crate::constants::UPDATE_ARTIFACT_NAME;
use crate::core::{LauncherError, Result};
use crate::net::HttpClient;
use crate::updater::decision::{UpdateCheckResult, UpdateState, check_result, decide};
use crate::updater::download::Downloader;
use crate::updater::events::{EventSink, UpdateEvent};
use crate::updater::installer::{InstallSequencer, ProcessControl};
use crate::updater::manifest::{ManifestFetcher, VersionManifest};
use crate::updater::skip_marker::SkipMarkerStore;
use crate::updater::verification::ChecksumVerifier;
use crate::updater::version_cache::{VersionCacheStore, VersionCheckCache};
use crate::version::VersionComparator;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Result of `install()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallOutcome {
    #[must_use]
    pub const fn installed() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Resets a busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    /// Claim `flag`, or `None` if it is already held.
    fn try_claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UpdateOrchestrator {
    config: UpdaterConfig,
    current_version: String,
    fetcher: ManifestFetcher,
    downloader: Downloader,
    skip_marker: SkipMarkerStore,
    version_cache: VersionCacheStore,
    sink: Arc<dyn EventSink>,
    sequencer: InstallSequencer,
    artifact_path: PathBuf,
    last_manifest: Mutex<Option<VersionManifest>>,
    check_lock: tokio::sync::Mutex<()>,
    installing: AtomicBool,
    cycle_busy: AtomicBool,
}

impl UpdateOrchestrator {
    /// Build an orchestrator storing its state under `data_dir`.
    ///
    /// The primary executable defaults to the running executable when the config does
    /// not name one. The installer artifact goes to the system temp directory.
    pub fn new(
        config: UpdaterConfig,
        data_dir: &Path,
        current_version: impl Into<String>,
        sink: Arc<dyn EventSink>,
        process: Arc<dyn ProcessControl>,
    ) -> Result<Self> {
        let http = HttpClient::new(config.request_timeout(), config.max_redirects)?;
        let primary = config
            .primary_executable
            .clone()
            .or_else(|| std::env::current_exe().ok());
        let version_cache = VersionCacheStore::in_dir(data_dir);
        // the cached check result describes the version being replaced
        let sequencer = InstallSequencer::new(process, config.install_settle(), config.exit_delay())
            .with_primary_executable(primary)
            .with_transient_files(vec![version_cache.path().to_path_buf()]);

        Ok(Self {
            current_version: current_version.into(),
            fetcher: ManifestFetcher::new(http.clone()),
            downloader: Downloader::new(http),
            skip_marker: SkipMarkerStore::in_dir(data_dir),
            version_cache,
            sink,
            sequencer,
            artifact_path: std::env::temp_dir().join(UPDATE_ARTIFACT_NAME),
            last_manifest: Mutex::new(None),
            check_lock: tokio::sync::Mutex::new(()),
            installing: AtomicBool::new(false),
            cycle_busy: AtomicBool::new(false),
            config,
        })
    }

    /// Where the installer artifact is downloaded to.
    #[must_use]
    pub fn with_artifact_path(mut self, path: PathBuf) -> Self {
        self.artifact_path = path;
        self
    }

    /// Arguments for the relaunched executable.
    #[must_use]
    pub fn with_relaunch_args(mut self, args: Vec<String>) -> Self {
        self.sequencer = self.sequencer.with_relaunch_args(args);
        self
    }

    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    #[must_use]
    pub const fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    #[must_use]
    pub const fn skip_marker(&self) -> &SkipMarkerStore {
        &self.skip_marker
    }

    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    fn emit_error(&self, err: &LauncherError) -> String {
        let message = err.to_string();
        error!(kind = err.kind(), "{message}");
        self.sink.notify(UpdateEvent::Error {
            message: message.clone(),
        });
        message
    }

    /// Run one update check. Concurrent calls are serialised.
    pub async fn check(&self) -> UpdateCheckResult {
        let _serial = self.check_lock.lock().await;
        self.sink.notify(UpdateEvent::Checking);
        debug!(state = %UpdateState::Checking, current = %self.current_version, "checking for updates");

        match self.run_check().await {
            Ok(result) => result,
            Err(e) => {
                let message = self.emit_error(&e);
                UpdateCheckResult::error(&self.current_version, message)
            }
        }
    }

    async fn run_check(&self) -> Result<UpdateCheckResult> {
        let url = self.config.manifest_url.as_deref().ok_or_else(|| LauncherError::ConfigError {
            message: "updater.manifest_url is not set".to_string(),
        })?;

        let manifest = self.fetcher.fetch(url).await?;

        let decision = {
            let marker = self.skip_marker.lock().await?;
            let current_marker = marker.read().await?;
            let decision = decide(&self.current_version, &manifest.version, current_marker.as_deref())?;
            if decision.clear_marker {
                marker.clear().await?;
            }
            decision
        };

        let result = check_result(&self.current_version, &manifest, &decision);
        match decision.state {
            UpdateState::UpdateAvailable => {
                info!(latest = %manifest.version, current = %self.current_version, "update available");
                self.sink.notify(UpdateEvent::Available {
                    version: manifest.version.clone(),
                    download_url: manifest.download_url.clone(),
                    changelog: manifest.changelog.clone(),
                });
            }
            UpdateState::Skipped => {
                info!(version = %manifest.version, "update previously attempted, skipping");
                self.sink.notify(UpdateEvent::NotAvailable);
            }
            _ => {
                info!(current = %self.current_version, "no updates available");
                self.sink.notify(UpdateEvent::NotAvailable);
            }
        }

        let record = VersionCheckCache::new(
            self.current_version.clone(),
            manifest.version.clone(),
            result.is_update_available(),
        );
        if let Err(e) = self.version_cache.save(&record).await {
            warn!("Failed to save version cache: {e:#}");
        }

        if let Ok(mut last) = self.last_manifest.lock() {
            *last = Some(manifest);
        }
        Ok(result)
    }

    /// Download `download_url` and install it as `target_version`.
    ///
    /// Without a target, or with a target equal to the running version, nothing is
    /// downloaded; a given target is still recorded as the skip marker. Otherwise the
    /// marker is written before the download starts and is never cleared here.
    ///
    /// On success this terminates the process (after the exit delay) through the
    /// injected process control.
    pub async fn install(&self, download_url: &str, target_version: Option<&str>) -> InstallOutcome {
        let Some(_busy) = BusyGuard::try_claim(&self.installing) else {
            warn!("install already in progress, ignoring request");
            return InstallOutcome::failed("an install is already in progress");
        };

        match self.run_install(download_url, target_version).await {
            Ok(outcome) => outcome,
            Err(e) => InstallOutcome::failed(self.emit_error(&e)),
        }
    }

    async fn run_install(&self, download_url: &str, target_version: Option<&str>) -> Result<InstallOutcome> {
        let Some(target) = target_version.map(str::trim).filter(|t| !t.is_empty()) else {
            info!("no target version given, not installing");
            return Ok(InstallOutcome::failed("no target version given"));
        };

        if VersionComparator::is_same(target, &self.current_version)? {
            info!(target, "target is the running version, not installing");
            self.skip_marker.set(target).await?;
            return Ok(InstallOutcome::failed(format!("version {target} is already running")));
        }

        // must land before any byte is downloaded
        self.skip_marker.set(target).await?;
        debug!(state = %UpdateState::Installing, target, "starting install");

        self.sink.notify(UpdateEvent::Downloading {
            version: target.to_string(),
        });
        let sink = Arc::clone(&self.sink);
        self.downloader
            .download(download_url, &self.artifact_path, move |progress| sink.notify(progress.into()))
            .await?;

        if self.config.verify_checksum
            && let Some(expected) = self.expected_checksum(download_url)
            && let Err(e) = ChecksumVerifier::verify_checksum(&self.artifact_path, &expected).await
        {
            crate::utils::remove_file_best_effort(&self.artifact_path).await;
            return Err(e);
        }

        info!(target, path = %self.artifact_path.display(), "download complete, installing");
        self.sink.notify(UpdateEvent::Downloaded {
            version: target.to_string(),
        });

        self.sequencer.install_and_relaunch(&self.artifact_path, &self.config.install_args).await?;
        Ok(InstallOutcome::installed())
    }

    /// Checksum from the last fetched manifest, if it advertised this URL.
    fn expected_checksum(&self, download_url: &str) -> Option<String> {
        let last = self.last_manifest.lock().ok()?;
        last.as_ref().filter(|m| m.download_url == download_url).and_then(|m| m.sha256.clone())
    }

    /// Scheduled cycle: check, then install when `auto_install` is on.
    ///
    /// Returns `None` without doing anything if a cycle or install is already running.
    pub async fn check_and_maybe_install(&self) -> Option<UpdateCheckResult> {
        let Some(_busy) = BusyGuard::try_claim(&self.cycle_busy) else {
            debug!("update cycle already running, dropping request");
            return None;
        };
        if self.installing.load(Ordering::Acquire) {
            debug!("install in progress, dropping check request");
            return None;
        }

        let result = self.check().await;
        if self.config.auto_install
            && result.is_update_available()
            && let Some(url) = result.download_url.as_deref()
        {
            let outcome = self.install(url, result.latest_version.as_deref()).await;
            if !outcome.success {
                warn!(error = ?outcome.error, "automatic install did not complete");
            }
        }
        Some(result)
    }
}
