//! Launchpad command-line entry point.

use anyhow::Result;
use clap::Parser;
use launchpad_cli::cli;
use launchpad_cli::core::user_friendly_error;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays clean for `--json` output.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    init_logging(config.log_level.as_deref());

    match cli.execute_with_config(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
