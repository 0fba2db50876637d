//! Launchpad - update and download core of a desktop launcher.
//!
//! The launcher keeps itself current by polling a version manifest, downloading the
//! advertised installer, running it silently and relaunching. A persisted skip marker
//! stops a failed install from being retried forever. Next to self-update it manages a
//! catalog of downloadable products, a local artifact cache for them, and launching
//! their executables.
//!
//! # Core Modules
//!
//! ## Self-update
//! - [`updater`] - Manifest fetch, loop guard, download, install sequence, scheduler
//! - [`version`] - Dotted numeric version comparison
//! - [`net`] - HTTP client with manual redirect handling
//!
//! ## Products
//! - [`catalog`] - Product catalog sync and outdated detection
//! - [`cache`] - Artifact cache and detached launch
//!
//! ## Support
//! - [`cli`] - Command-line interface
//! - [`config`] - `~/.launchpad/config.toml`
//! - [`core`] - Error types and user-facing error formatting
//! - [`utils`] - Atomic writes, file locks, progress bars, platform helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use launchpad_cli::config::UpdaterConfig;
//! use launchpad_cli::updater::{LogSink, SystemProcessControl, UpdateOrchestrator};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpdaterConfig {
//!     manifest_url: Some("https://example.com/version.json".to_string()),
//!     ..UpdaterConfig::default()
//! };
//! let orchestrator = UpdateOrchestrator::new(
//!     config,
//!     Path::new("/var/lib/launchpad"),
//!     "1.0.0",
//!     Arc::new(LogSink),
//!     Arc::new(SystemProcessControl),
//! )?;
//!
//! let result = orchestrator.check().await;
//! if let (Some(url), Some(version)) = (&result.download_url, &result.latest_version) {
//!     orchestrator.install(url, Some(version.as_str())).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod net;
pub mod updater;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
