//! Command-line interface for the launcher's update and download services.
//!
//! # Commands
//!
//! ## Self-update
//! - `check` - Fetch the version manifest and report whether an update is offered
//! - `install` - Download the installer, run it, relaunch and exit
//! - `run` - Keep a scheduler running (startup + periodic checks, stdin control)
//! - `status` - Show the running version, last check and skip marker offline
//! - `skip` - Inspect, set or clear the skip marker
//!
//! ## Products
//! - `catalog` - List, sync and diff the product catalog
//! - `cache` - Download product artifacts into the local cache
//! - `launch` - Start a product executable detached
//!
//! ## Configuration
//! - `config` - Create, show or locate the configuration file
//!
//! # Example
//!
//! ```bash
//! launchpad config init
//! launchpad check
//! launchpad --no-progress install
//! launchpad run --json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cache;
mod catalog;
mod check;
pub mod common;
mod config;
mod install;
mod launch;
mod run;
mod skip;
mod status;

use crate::config::LauncherConfig;
use common::CliContext;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Tracing filter directive; `None` leaves `RUST_LOG` (or the default) in charge.
    pub log_level: Option<String>,
    pub quiet: bool,
    pub no_progress: bool,
    pub config_path: Option<PathBuf>,
}

#[derive(Parser)]
#[command(
    name = "launchpad",
    about = "Desktop launcher updater - check, download and install launcher and product updates",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file (overrides LAUNCHPAD_CONFIG_PATH)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true, env = crate::utils::progress::NO_PROGRESS_ENV)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check for a launcher update.
    Check(check::CheckCommand),

    /// Download and install a launcher update.
    Install(install::InstallCommand),

    /// Run the update scheduler until interrupted.
    Run(run::RunCommand),

    /// Show updater state without touching the network.
    Status(status::StatusCommand),

    /// Manage the skip marker.
    Skip(skip::SkipCommand),

    /// Manage the product catalog.
    Catalog(catalog::CatalogCommand),

    /// Manage cached product downloads.
    Cache(cache::CacheCommand),

    /// Start a product executable.
    Launch(launch::LaunchCommand),

    /// Manage the configuration file.
    Config(config::ConfigCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let explicit = config.config_path.as_deref();
        let context = || CliContext::load(explicit, config.quiet, config.no_progress);

        match self.command {
            Commands::Check(cmd) => cmd.execute(&context().await?).await,
            Commands::Install(cmd) => cmd.execute(&context().await?).await,
            Commands::Run(cmd) => cmd.execute(&context().await?).await,
            Commands::Status(cmd) => cmd.execute(&context().await?).await,
            Commands::Skip(cmd) => cmd.execute(&context().await?).await,
            Commands::Catalog(cmd) => cmd.execute(&context().await?).await,
            Commands::Cache(cmd) => cmd.execute(&context().await?).await,
            Commands::Launch(cmd) => cmd.execute(&context().await?).await,
            // works on the file itself, so a broken config can still be replaced
            Commands::Config(cmd) => cmd.execute(&LauncherConfig::resolve_path(explicit)?).await,
        }
    }
}
