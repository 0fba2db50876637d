//! Download and install a launcher update.
//!
//! Without `--url` the manifest is checked first and the offered update is installed.
//! On success the installer is started, the launcher relaunched and this process exits.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use crate::cli::common::{CliContext, TerminalSink};

#[derive(Args)]
pub struct InstallCommand {
    /// Installer URL; requires --version
    #[arg(long, requires = "version")]
    url: Option<String>,

    /// Version the installer provides; recorded before downloading
    #[arg(long)]
    version: Option<String>,
}

impl InstallCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let sink = Arc::new(TerminalSink::new(ctx.show_progress(), ctx.quiet));
        let orchestrator = ctx.orchestrator(sink)?;

        let (url, version) = match (self.url, self.version) {
            (Some(url), version) => (url, version),
            (None, _) => {
                let result = orchestrator.check().await;
                if let Some(error) = result.error {
                    bail!("Update check failed: {error}");
                }
                match (result.download_url, result.latest_version) {
                    (Some(url), Some(version)) if result.outcome.reports_update() => (url, Some(version)),
                    _ => {
                        if !ctx.quiet {
                            println!("{}", "Nothing to install".green());
                        }
                        return Ok(());
                    }
                }
            }
        };

        let outcome = orchestrator.install(&url, version.as_deref()).await;
        match outcome.error {
            Some(error) => bail!("Install did not complete: {error}"),
            None => Ok(()),
        }
    }
}
