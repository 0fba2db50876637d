//! Update decision and loop guard.
//!
//! Given the running version, a freshly fetched manifest and the current skip marker,
//! [`decide`] picks the state the check ends in and whether the marker must be cleared.
//! It is pure; the orchestrator applies the result.
//!
//! Rules, in order:
//!
//! 1. A marker at or below the running version is cleared before anything else.
//! 2. A manifest equal to a (still active) marker that is newer than the running
//!    version is skipped: that update was already attempted and did not take.
//! 3. A manifest newer than the running version is offered.
//! 4. Otherwise the installation is up to date.

use crate::core::Result;
use crate::updater::manifest::VersionManifest;
use crate::version::DottedVersion;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of the updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateState {
    Checking,
    UpToDate,
    UpdateAvailable,
    Skipped,
    Installing,
    Error,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Checking => "checking",
            Self::UpToDate => "up to date",
            Self::UpdateAvailable => "update available",
            Self::Skipped => "skipped",
            Self::Installing => "installing",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Outcome reported to callers of `check()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckOutcome {
    NoUpdate,
    UpdateAvailable,
    Skipped,
    Error,
}

impl CheckOutcome {
    /// Skipped updates are presented as "no update".
    #[must_use]
    pub const fn reports_update(self) -> bool {
        matches!(self, Self::UpdateAvailable)
    }
}

/// Result of a single update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheckResult {
    pub outcome: CheckOutcome,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changelog: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateCheckResult {
    /// Failed check. The marker is left untouched.
    #[must_use]
    pub fn error(current_version: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            outcome: CheckOutcome::Error,
            current_version: current_version.into(),
            latest_version: None,
            download_url: None,
            changelog: Vec::new(),
            sha256: None,
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub const fn is_update_available(&self) -> bool {
        self.outcome.reports_update()
    }
}

/// What a check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: UpdateState,
    /// The stored marker must be removed (rule 1).
    pub clear_marker: bool,
}

impl Decision {
    #[must_use]
    pub const fn outcome(&self) -> CheckOutcome {
        match self.state {
            UpdateState::UpdateAvailable => CheckOutcome::UpdateAvailable,
            UpdateState::Skipped => CheckOutcome::Skipped,
            UpdateState::Error => CheckOutcome::Error,
            _ => CheckOutcome::NoUpdate,
        }
    }
}

/// Apply the loop-guard rules.
///
/// # Errors
///
/// [`crate::core::LauncherError::InvalidVersionError`] if the running or manifest
/// version is malformed. A malformed marker is treated as stale and cleared.
pub fn decide(running: &str, manifest_version: &str, marker: Option<&str>) -> Result<Decision> {
    let running = DottedVersion::parse(running)?;
    let latest = DottedVersion::parse(manifest_version)?;

    let mut clear_marker = false;
    let mut active_marker = None;
    if let Some(raw) = marker {
        match DottedVersion::parse(raw) {
            Ok(marked) if running >= marked => clear_marker = true,
            Ok(marked) => active_marker = Some(marked),
            Err(e) => {
                tracing::warn!(marker = raw, error = %e, "ignoring malformed skip marker");
                clear_marker = true;
            }
        }
    }

    let state = match active_marker {
        Some(marked) if latest == marked && running < latest => UpdateState::Skipped,
        _ if latest > running => UpdateState::UpdateAvailable,
        _ => UpdateState::UpToDate,
    };

    Ok(Decision {
        state,
        clear_marker,
    })
}

/// Build the check result for a decided manifest.
#[must_use]
pub fn check_result(running: &str, manifest: &VersionManifest, decision: &Decision) -> UpdateCheckResult {
    let offered = decision.state == UpdateState::UpdateAvailable;
    UpdateCheckResult {
        outcome: decision.outcome(),
        current_version: running.to_string(),
        latest_version: Some(manifest.version.clone()),
        download_url: offered.then(|| manifest.download_url.clone()),
        changelog: if offered {
            manifest.changelog.clone()
        } else {
            Vec::new()
        },
        sha256: if offered {
            manifest.sha256.clone()
        } else {
            None
        },
        error: None,
    }
}
