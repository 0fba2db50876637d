//! Run the update scheduler in the foreground.
//!
//! Checks once after the startup delay and then every `check_interval_secs`. A host
//! process can drive it over stdin, one command per line:
//!
//! ```text
//! check                      run a check now
//! install <url> <version>    download and install
//! quit                       stop the scheduler and exit
//! ```
//!
//! With `--json` every update event is written to stdout as one JSON object per line.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::cli::common::{CliContext, TerminalSink};
use crate::updater::{ChannelSink, EventSink, Scheduler, UpdateOrchestrator};

#[derive(Args)]
pub struct RunCommand {
    /// Emit update events as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Install available updates without asking
    #[arg(long)]
    auto_install: bool,
}

/// A line read from stdin.
#[derive(Debug, PartialEq, Eq)]
enum HostCommand {
    Check,
    Install {
        url: String,
        version: String,
    },
    Quit,
}

impl HostCommand {
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        match parts.next()? {
            "check" => Some(Self::Check),
            "quit" | "exit" => Some(Self::Quit),
            "install" => {
                let url = parts.next()?.to_string();
                let version = parts.next()?.to_string();
                Some(Self::Install {
                    url,
                    version,
                })
            }
            _ => None,
        }
    }
}

impl RunCommand {
    pub async fn execute(self, ctx: &CliContext) -> Result<()> {
        let mut ctx = ctx.clone();
        if self.auto_install {
            ctx.config.updater.auto_install = true;
        }

        let sink: Arc<dyn EventSink> = if self.json {
            let (sink, mut rx) = ChannelSink::channel();
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => warn!("Failed to encode event: {e}"),
                    }
                }
            });
            Arc::new(sink)
        } else {
            Arc::new(TerminalSink::new(ctx.show_progress(), ctx.quiet))
        };

        let mut relaunch_args = vec!["run".to_string()];
        if self.json {
            relaunch_args.push("--json".to_string());
        }
        let orchestrator = Arc::new(ctx.orchestrator(sink)?.with_relaunch_args(relaunch_args));
        let scheduler = Scheduler::from_config(Arc::clone(&orchestrator), &ctx.config.updater);
        scheduler.start();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    break;
                }
                line = lines.next_line(), if stdin_open => {
                    match line {
                        Ok(Some(line)) => match HostCommand::parse(&line) {
                            Some(HostCommand::Check) => scheduler.trigger(),
                            Some(HostCommand::Install { url, version }) => {
                                spawn_install(&orchestrator, url, version);
                            }
                            Some(HostCommand::Quit) => break,
                            None if line.trim().is_empty() => {}
                            None => warn!(command = line.trim(), "unknown command"),
                        },
                        Ok(None) => stdin_open = false,
                        Err(e) => {
                            warn!("Failed to read stdin: {e}");
                            stdin_open = false;
                        }
                    }
                }
            }
        }

        scheduler.stop().await;
        Ok(())
    }
}

fn spawn_install(orchestrator: &Arc<UpdateOrchestrator>, url: String, version: String) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        let outcome = orchestrator.install(&url, Some(&version)).await;
        if let Some(error) = outcome.error {
            warn!(%version, "install did not complete: {error}");
        }
    });
}
