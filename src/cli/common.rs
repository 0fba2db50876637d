//! Shared plumbing for CLI commands: resolved configuration and terminal event output.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::LauncherConfig;
use crate::net::HttpClient;
use crate::updater::{
    Downloader, EventSink, ManifestFetcher, ProcessControl, SystemProcessControl, UpdateEvent,
    UpdateOrchestrator,
};
use crate::utils::ProgressBar;

/// Configuration and paths every command works from.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: LauncherConfig,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub quiet: bool,
    pub no_progress: bool,
}

impl CliContext {
    /// Resolve the config file (explicit path, `LAUNCHPAD_CONFIG_PATH`, or default) and
    /// load it.
    pub async fn load(explicit: Option<&Path>, quiet: bool, no_progress: bool) -> Result<Self> {
        let config_path = LauncherConfig::resolve_path(explicit)?;
        let config = LauncherConfig::load_or_default(&config_path).await?;
        let data_dir = config.data_dir(&config_path)?;
        tracing::debug!(
            config = %config_path.display(),
            data_dir = %data_dir.display(),
            "loaded configuration"
        );

        Ok(Self {
            config,
            config_path,
            data_dir,
            quiet,
            no_progress,
        })
    }

    /// Whether progress bars should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.no_progress && !self.quiet
    }

    pub fn http_client(&self) -> Result<HttpClient> {
        HttpClient::new(self.config.updater.request_timeout(), self.config.updater.max_redirects)
            .context("Failed to build HTTP client")
    }

    pub fn fetcher(&self) -> Result<ManifestFetcher> {
        Ok(ManifestFetcher::new(self.http_client()?))
    }

    pub fn downloader(&self) -> Result<Downloader> {
        Ok(Downloader::new(self.http_client()?))
    }

    /// Orchestrator wired to the real process control.
    pub fn orchestrator(&self, sink: Arc<dyn EventSink>) -> Result<UpdateOrchestrator> {
        self.orchestrator_with(sink, Arc::new(SystemProcessControl))
    }

    pub fn orchestrator_with(
        &self,
        sink: Arc<dyn EventSink>,
        process: Arc<dyn ProcessControl>,
    ) -> Result<UpdateOrchestrator> {
        UpdateOrchestrator::new(
            self.config.updater.clone(),
            &self.data_dir,
            self.config.running_version(),
            sink,
            process,
        )
        .context("Failed to initialise updater")
    }
}

/// Prints update events to the terminal, with a progress bar while downloading.
pub struct TerminalSink {
    show_progress: bool,
    quiet: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalSink {
    #[must_use]
    pub const fn new(show_progress: bool, quiet: bool) -> Self {
        Self {
            show_progress,
            quiet,
            bar: Mutex::new(None),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut bar) = self.bar.lock()
            && let Some(bar) = bar.take()
        {
            bar.finish_and_clear();
        }
    }
}

impl EventSink for TerminalSink {
    fn notify(&self, event: UpdateEvent) {
        match event {
            UpdateEvent::Checking => {
                if !self.quiet {
                    println!("{}", "Checking for updates...".cyan());
                }
            }
            UpdateEvent::Available {
                version,
                changelog,
                ..
            } => {
                if !self.quiet {
                    println!("{}", format!("Update available: {version}").green().bold());
                    for line in changelog {
                        println!("  • {line}");
                    }
                }
            }
            UpdateEvent::NotAvailable => {
                if !self.quiet {
                    println!("No update available");
                }
            }
            UpdateEvent::Downloading {
                version,
            } => {
                if !self.quiet {
                    println!("{}", format!("Downloading {version}...").cyan());
                }
            }
            UpdateEvent::Progress {
                downloaded,
                total,
                ..
            } => {
                if !self.show_progress {
                    return;
                }
                if let Ok(mut slot) = self.bar.lock() {
                    let bar = slot.get_or_insert_with(|| {
                        let bar = ProgressBar::download(total);
                        bar.set_prefix("update");
                        bar
                    });
                    bar.set_position(downloaded);
                }
            }
            UpdateEvent::Downloaded {
                version,
            } => {
                self.finish_bar();
                if !self.quiet {
                    println!("{}", format!("Downloaded {version}, installing...").green());
                }
            }
            UpdateEvent::Error {
                message,
            } => {
                self.finish_bar();
                eprintln!("{}: {message}", "error".red().bold());
            }
        }
    }
}
