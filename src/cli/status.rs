//! Offline view of the updater state: running version, last check and skip marker.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::cli::common::CliContext;
use crate::updater::{SkipMarkerStore, VersionCacheStore, VersionCheckCache};

#[derive(Args)]
pub struct StatusCommand {
    /// Print the status as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    current_version: String,
    manifest_url: Option<String>,
    data_dir: String,
    skip_marker: Option<String>,
    last_check: Option<VersionCheckCache>,
}

impl StatusCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let report = StatusReport {
            current_version: ctx.config.running_version(),
            manifest_url: ctx.config.updater.manifest_url.clone(),
            data_dir: ctx.data_dir.display().to_string(),
            skip_marker: SkipMarkerStore::in_dir(&ctx.data_dir).read().await?,
            last_check: VersionCacheStore::in_dir(&ctx.data_dir).load().await?,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{} {}", "Version:".bold(), report.current_version);
        println!(
            "{} {}",
            "Manifest:".bold(),
            report.manifest_url.as_deref().unwrap_or("(not configured)")
        );
        println!("{} {}", "Data dir:".bold(), report.data_dir);
        match &report.skip_marker {
            Some(marker) => println!("{} {}", "Skip marker:".bold(), marker.yellow()),
            None => println!("{} none", "Skip marker:".bold()),
        }
        match &report.last_check {
            Some(last) => {
                let stale = !last.is_fresh(ctx.config.updater.check_interval_secs);
                let when = last.checked_at.format("%Y-%m-%d %H:%M:%S UTC");
                let latest = if last.update_available {
                    format!("{} (update available)", last.latest_version).green().to_string()
                } else {
                    last.latest_version.clone()
                };
                println!(
                    "{} {latest}, checked {when}{}",
                    "Latest:".bold(),
                    if stale { " (stale)".dimmed().to_string() } else { String::new() }
                );
            }
            None => println!("{} never checked", "Latest:".bold()),
        }
        Ok(())
    }
}
