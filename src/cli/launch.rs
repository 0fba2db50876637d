//! Start a product executable detached from the launcher.
//!
//! ```bash
//! launchpad launch ./sandbox.exe -- --windowed
//! launchpad launch --product sandbox
//! ```

use anyhow::{Result, anyhow, bail};
use clap::Args;
use std::path::PathBuf;

use crate::catalog::CatalogStore;
use crate::cli::common::CliContext;
use crate::updater::SystemProcessControl;

#[derive(Args)]
pub struct LaunchCommand {
    /// Executable to start; bare names are looked up on PATH
    #[arg(required_unless_present = "product", conflicts_with = "product")]
    path: Option<PathBuf>,

    /// Launch the executable recorded for this catalog product
    #[arg(long)]
    product: Option<String>,

    /// Arguments passed to the executable
    #[arg(last = true)]
    args: Vec<String>,
}

impl LaunchCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let path = match (self.path, self.product) {
            (Some(path), _) => path,
            (None, Some(product)) => {
                let store = CatalogStore::new(
                    &ctx.data_dir,
                    ctx.config.products_dir(&ctx.data_dir)?,
                    ctx.fetcher()?,
                );
                let catalog = store
                    .load()
                    .await?
                    .ok_or_else(|| anyhow!("No local catalog; run `launchpad catalog sync`"))?;
                let entry =
                    catalog.get(&product).ok_or_else(|| anyhow!("Unknown product '{product}'"))?;
                match &entry.executable_path {
                    Some(exe) => PathBuf::from(exe),
                    None => bail!("Product '{product}' has no executable path"),
                }
            }
            (None, None) => bail!("Nothing to launch"),
        };

        crate::cache::launch(&SystemProcessControl, &path, &self.args)?;
        if !ctx.quiet {
            println!("✅ Launched {}", path.display());
        }
        Ok(())
    }
}
