//! One-shot update check.
//!
//! ```bash
//! launchpad check              # human readable
//! launchpad check --json       # structured result on stdout
//! launchpad check --install    # install straight away if an update is offered
//! ```

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use crate::cli::common::{CliContext, TerminalSink};
use crate::updater::{CheckOutcome, EventSink, LogSink, UpdateCheckResult};

#[derive(Args)]
pub struct CheckCommand {
    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Download and install the update if one is available
    #[arg(long, conflicts_with = "json")]
    install: bool,
}

impl CheckCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let sink: Arc<dyn EventSink> = if self.json {
            Arc::new(LogSink)
        } else {
            Arc::new(TerminalSink::new(ctx.show_progress(), ctx.quiet))
        };
        let orchestrator = ctx.orchestrator(sink)?;
        let result = orchestrator.check().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        if !ctx.quiet {
            print_summary(&result);
        }
        if let Some(error) = &result.error {
            bail!("Update check failed: {error}");
        }

        if self.install
            && let (Some(url), Some(version)) = (&result.download_url, &result.latest_version)
        {
            let outcome = orchestrator.install(url, Some(version)).await;
            if let Some(error) = outcome.error {
                bail!("Install did not complete: {error}");
            }
        }
        Ok(())
    }
}

fn print_summary(result: &UpdateCheckResult) {
    match result.outcome {
        CheckOutcome::UpdateAvailable => {
            if let Some(latest) = &result.latest_version {
                println!("{} -> {}", result.current_version.yellow(), latest.green());
            }
            if let Some(url) = &result.download_url {
                println!("  {} {url}", "download:".dimmed());
            }
        }
        CheckOutcome::Skipped => {
            println!(
                "{}",
                format!(
                    "Version {} was already attempted; staying on {}",
                    result.latest_version.as_deref().unwrap_or("?"),
                    result.current_version
                )
                .yellow()
            );
        }
        CheckOutcome::NoUpdate => {
            println!("{}", format!("You are on the latest version ({})", result.current_version).green());
        }
        CheckOutcome::Error => {}
    }
}
