//! Inspect or reset the skip marker.
//!
//! The marker holds the version whose install was last attempted. While it matches the
//! manifest, checks report no update. Clearing it makes the next check offer that
//! version again.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::cli::common::CliContext;
use crate::updater::SkipMarkerStore;

#[derive(Args)]
pub struct SkipCommand {
    #[command(subcommand)]
    command: Option<SkipSubcommands>,
}

#[derive(Subcommand)]
enum SkipSubcommands {
    /// Print the current marker (the default).
    Show,

    /// Remove the marker.
    Clear,

    /// Mark a version as attempted so checks stop offering it.
    Set {
        version: String,
    },
}

impl SkipCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let store = SkipMarkerStore::in_dir(&ctx.data_dir);
        match self.command {
            Some(SkipSubcommands::Show) | None => match store.read().await? {
                Some(version) => println!("{version}"),
                None => println!("{}", "No skip marker set".dimmed()),
            },
            Some(SkipSubcommands::Clear) => {
                if store.clear().await? {
                    println!("✅ Skip marker cleared");
                } else {
                    println!("No skip marker set");
                }
            }
            Some(SkipSubcommands::Set {
                version,
            }) => {
                store.set(&version).await?;
                println!("✅ Skipping version {}", version.trim());
            }
        }
        Ok(())
    }
}
