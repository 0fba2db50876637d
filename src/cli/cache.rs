//! Artifact cache commands.
//!
//! ```bash
//! launchpad cache fetch sandbox https://example.com/sandbox.exe
//! launchpad cache lookup sandbox.exe
//! launchpad cache list
//! launchpad cache size
//! launchpad cache clear
//! ```

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::cache::{ArtifactCache, format_bytes};
use crate::cli::common::CliContext;
use crate::utils::ProgressBar;

#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: Option<CacheSubcommands>,
}

#[derive(Subcommand)]
enum CacheSubcommands {
    /// Download a product artifact unless it is already cached.
    Fetch {
        /// Product id the artifact belongs to
        product: String,
        url: String,
        /// File name in the cache; defaults to the last URL path segment
        #[arg(long)]
        filename: Option<String>,
    },

    /// Show whether a file is cached.
    Lookup {
        filename: String,
    },

    /// List recorded downloads (the default).
    List,

    /// Total size of cached artifacts.
    Size,

    /// Remove all cached artifacts.
    Clear,
}

impl CacheCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let cache = ArtifactCache::new(&ctx.data_dir, ctx.downloader()?);

        match self.command.unwrap_or(CacheSubcommands::List) {
            CacheSubcommands::Fetch {
                product,
                url,
                filename,
            } => {
                let filename = match filename {
                    Some(name) => name,
                    None => filename_from_url(&url)?,
                };
                let bar =
                    if ctx.show_progress() { ProgressBar::download(None) } else { ProgressBar::hidden() };
                bar.set_prefix(product.clone());

                let result = cache
                    .fetch(&product, &url, &filename, |progress| {
                        if let Some(total) = progress.total {
                            bar.set_length(total);
                        }
                        bar.set_position(progress.transferred);
                    })
                    .await;
                bar.finish_and_clear();

                let artifact = result.with_context(|| format!("Failed to fetch {url}"))?;
                if artifact.cached {
                    println!("{} {}", "Cached:".green(), artifact.path.display());
                } else {
                    println!("✅ Downloaded to {}", artifact.path.display());
                }
            }
            CacheSubcommands::Lookup {
                filename,
            } => match cache.lookup(&filename).await? {
                Some(found) => {
                    println!("{}", found.path.display());
                    println!("  size: {}", format_bytes(found.size));
                    if let Some(modified) = found.modified {
                        println!("  modified: {}", modified.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                }
                None => println!("{} is not cached", filename),
            },
            CacheSubcommands::List => {
                let entries = cache.entries().await?;
                if entries.is_empty() {
                    println!("Cache is empty");
                }
                for (product, entry) in &entries {
                    println!(
                        "{} {} {}",
                        product.bold(),
                        entry.filename,
                        entry.downloaded_at.format("%Y-%m-%d").to_string().dimmed()
                    );
                }
            }
            CacheSubcommands::Size => {
                println!("{}", format_bytes(cache.size().await?));
            }
            CacheSubcommands::Clear => {
                let removed = cache.clear().await?;
                println!("✅ Removed {removed} cached files");
            }
        }
        Ok(())
    }
}

fn filename_from_url(url: &str) -> Result<String> {
    let parsed = reqwest::Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Cannot derive a file name from {url}; pass --filename"))
}
