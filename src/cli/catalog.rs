//! Product catalog commands.
//!
//! ```bash
//! launchpad catalog list        # local catalog, synced on first use
//! launchpad catalog sync        # replace the local catalog with the remote one
//! launchpad catalog outdated    # products whose remote version differs
//! ```

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::catalog::{CatalogStore, ProductSummary};
use crate::cli::common::CliContext;

#[derive(Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    command: Option<CatalogSubcommands>,

    /// Catalog URL, overriding catalog.catalog_url
    #[arg(long, global = true)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum CatalogSubcommands {
    /// List products (the default).
    List {
        #[arg(long)]
        json: bool,
    },

    /// Download the remote catalog.
    Sync,

    /// Show products with a newer remote version.
    Outdated {
        #[arg(long)]
        json: bool,
    },
}

impl CatalogCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let remote_url = self.url.or_else(|| ctx.config.catalog.catalog_url.clone());
        let products_dir = ctx.config.products_dir(&ctx.data_dir)?;
        let store = CatalogStore::new(&ctx.data_dir, products_dir, ctx.fetcher()?);

        match self.command.unwrap_or(CatalogSubcommands::List {
            json: false,
        }) {
            CatalogSubcommands::List {
                json,
            } => {
                let products = store.list(remote_url.as_deref()).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&products)?);
                } else {
                    print_products(&products);
                }
            }
            CatalogSubcommands::Sync => {
                let url = require_url(remote_url)?;
                let catalog = store.sync(&url).await.context("Failed to sync catalog")?;
                println!("✅ Synced {} products to {}", catalog.len(), store.path().display());
            }
            CatalogSubcommands::Outdated {
                json,
            } => {
                let url = require_url(remote_url)?;
                let report = store.outdated(&url).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else if report.local_missing {
                    println!("{}", "No local catalog; run `launchpad catalog sync`".yellow());
                } else if report.updates.is_empty() {
                    println!("{}", "All products are up to date".green());
                } else {
                    for update in &report.updates {
                        println!(
                            "  {} {} -> {}",
                            update.name.bold(),
                            update.old_version.as_deref().unwrap_or("(new)").yellow(),
                            update.new_version.green()
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

fn require_url(url: Option<String>) -> Result<String> {
    match url {
        Some(url) => Ok(url),
        None => bail!("No catalog URL; set catalog.catalog_url or pass --url"),
    }
}

fn print_products(products: &[ProductSummary]) {
    if products.is_empty() {
        println!("No products in catalog");
        return;
    }
    for product in products {
        let state = if product.is_downloaded {
            "downloaded".green()
        } else {
            "not downloaded".dimmed()
        };
        println!(
            "{} {} {} [{}] {}",
            product.icon,
            product.name.bold(),
            product.version,
            product.category,
            state
        );
    }
}
