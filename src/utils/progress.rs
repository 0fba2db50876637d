//! Progress indicators for downloads and other long-running operations.
//!
//! Thin wrapper over `indicatif` with launcher styling. All indicators are hidden
//! when the `LAUNCHPAD_NO_PROGRESS` environment variable is set (any value), or when
//! `--no-progress` is passed on the command line.
//!
//! ```rust
//! use launchpad_cli::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::download(Some(1024));
//! progress.set_prefix("update");
//! progress.set_position(512);
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

/// Environment variable that disables all progress output.
pub const NO_PROGRESS_ENV: &str = "LAUNCHPAD_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar or spinner with consistent styling.
///
/// Hidden bars silently accept every call, so callers never branch on whether
/// progress is enabled.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Byte-oriented bar for a transfer.
    ///
    /// With `total == None` (no `Content-Length`) a spinner showing transferred bytes is
    /// used instead.
    pub fn download(total: Option<u64>) -> Self {
        if is_progress_disabled() {
            return Self::hidden();
        }
        let bar = match total {
            Some(len) => {
                let bar = IndicatifBar::new(len);
                bar.set_style(ProgressStyle::download());
                bar
            }
            None => {
                let bar = IndicatifBar::new_spinner();
                bar.set_style(ProgressStyle::download_unknown());
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };
        Self {
            inner: bar,
        }
    }

    /// A bar that renders nothing.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn set_length(&self, len: u64) {
        self.inner.set_length(len);
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Launcher progress styles.
pub struct ProgressStyle;

impl ProgressStyle {
    /// Byte transfer with known total.
    ///
    /// ```text
    /// update [━━━━━━━━━━━━━━━━━━━━╸━━━━━━━━━━━━━━━━━━━] 2.1 MiB/4.2 MiB (00:05)
    /// ```
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }

    /// Byte transfer with unknown total.
    pub fn download_unknown() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.cyan} {bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
    }
}
