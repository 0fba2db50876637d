//! Manage the launcher configuration file.
//!
//! ```bash
//! launchpad config init          # write an example config
//! launchpad config show          # print the effective config
//! launchpad config path          # print where the config lives
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use crate::config::LauncherConfig;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write an example configuration file.
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (the default).
    Show,

    /// Print the configuration file path.
    Path,
}

impl ConfigCommand {
    pub async fn execute(self, config_path: &Path) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(force, config_path).await,
            Some(ConfigSubcommands::Show) | None => Self::show(config_path).await,
            Some(ConfigSubcommands::Path) => {
                println!("{}", config_path.display());
                Ok(())
            }
        }
    }

    async fn init(force: bool, config_path: &Path) -> Result<()> {
        if config_path.exists() && !force {
            println!("❌ Config already exists at: {}", config_path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        let config = LauncherConfig::init_example();
        config.save_to(config_path).await?;

        println!("✅ Created config at: {}", config_path.display());
        println!("\n{}", "Example configuration:".bold());
        println!("{}", toml::to_string_pretty(&config)?);
        println!("\n{}", "Next steps:".yellow());
        println!("  1. Point updater.manifest_url at your version.json");
        println!("  2. Point catalog.catalog_url at your product catalog");

        Ok(())
    }

    async fn show(config_path: &Path) -> Result<()> {
        let config = LauncherConfig::load_or_default(config_path).await?;
        if !config_path.exists() {
            println!("{}", format!("# {} not found, showing defaults", config_path.display()).dimmed());
        }
        println!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }
}
