//! Install and relaunch sequence.
//!
//! The downloaded artifact is an opaque installer invoked with a silent-install flag.
//! Installers give no completion signal once detached, so the sequencer waits a fixed
//! settle time, relaunches the primary executable, cleans up, and terminates the
//! current process.

use crate::core::{LauncherError, Result};
use crate::utils::platform;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Process operations the sequencer needs. Injected so tests never spawn or exit.
pub trait ProcessControl: Send + Sync {
    /// Start `program` detached from this process's lifetime.
    fn spawn_detached(&self, program: &Path, args: &[String]) -> std::io::Result<()>;

    /// Terminate the current process.
    fn exit(&self, code: i32);
}

/// Real process control.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessControl;

impl ProcessControl for SystemProcessControl {
    fn spawn_detached(&self, program: &Path, args: &[String]) -> std::io::Result<()> {
        let pid = platform::spawn_detached(program, args)?;
        info!(program = %program.display(), pid, "spawned detached process");
        Ok(())
    }

    fn exit(&self, code: i32) {
        info!(code, "exiting");
        std::process::exit(code);
    }
}

/// Runs the installer, relaunches, and exits.
#[derive(Clone)]
pub struct InstallSequencer {
    process: Arc<dyn ProcessControl>,
    settle: Duration,
    exit_delay: Duration,
    primary_executable: Option<PathBuf>,
    relaunch_args: Vec<String>,
    transient_files: Vec<PathBuf>,
}

impl InstallSequencer {
    #[must_use]
    pub fn new(process: Arc<dyn ProcessControl>, settle: Duration, exit_delay: Duration) -> Self {
        Self {
            process,
            settle,
            exit_delay,
            primary_executable: None,
            relaunch_args: Vec::new(),
            transient_files: Vec::new(),
        }
    }

    /// Executable started after the installer settles. Nothing is relaunched if it does
    /// not exist when the time comes.
    #[must_use]
    pub fn with_primary_executable(mut self, path: Option<PathBuf>) -> Self {
        self.primary_executable = path;
        self
    }

    #[must_use]
    pub fn with_relaunch_args(mut self, args: Vec<String>) -> Self {
        self.relaunch_args = args;
        self
    }

    /// Extra files removed (best-effort) alongside the artifact.
    #[must_use]
    pub fn with_transient_files(mut self, files: Vec<PathBuf>) -> Self {
        self.transient_files = files;
        self
    }

    #[must_use]
    pub fn primary_executable(&self) -> Option<&Path> {
        self.primary_executable.as_deref()
    }

    /// Invoke `artifact` with `install_args`, relaunch, clean up, and exit.
    ///
    /// With [`SystemProcessControl`] this does not return on success. With a fake
    /// control it returns `Ok(())` after requesting exit.
    ///
    /// # Errors
    ///
    /// [`LauncherError::InstallLaunchError`] if the artifact cannot be started. Nothing
    /// else fails: relaunch and cleanup problems are logged.
    pub async fn install_and_relaunch(&self, artifact: &Path, install_args: &[String]) -> Result<()> {
        if !artifact.is_file() {
            return Err(LauncherError::InstallLaunchError {
                path: artifact.display().to_string(),
                reason: "artifact does not exist".to_string(),
            });
        }

        info!(artifact = %artifact.display(), args = ?install_args, "starting installer");
        self.process.spawn_detached(artifact, install_args).map_err(|e| {
            LauncherError::InstallLaunchError {
                path: artifact.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        tokio::time::sleep(self.settle).await;

        match &self.primary_executable {
            Some(exe) if exe.exists() => {
                if let Err(e) = self.process.spawn_detached(exe, &self.relaunch_args) {
                    warn!(exe = %exe.display(), error = %e, "failed to relaunch");
                }
            }
            Some(exe) => warn!(exe = %exe.display(), "primary executable not found, not relaunching"),
            None => info!("no primary executable configured, not relaunching"),
        }

        crate::utils::remove_file_best_effort(artifact).await;
        for file in &self.transient_files {
            crate::utils::remove_file_best_effort(file).await;
        }

        tokio::time::sleep(self.exit_delay).await;
        self.process.exit(0);
        Ok(())
    }
}
