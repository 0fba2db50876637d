//! Launcher configuration.
//!
//! A single TOML file (see [`global`]) with two sections:
//!
//! - `[updater]` ([`UpdaterConfig`]) - manifest URL, schedule, install behaviour
//! - `[catalog]` ([`CatalogConfig`]) - product catalog source and product folders

pub mod global;
pub mod updater;

pub use global::{CONFIG_PATH_ENV, LauncherConfig};
pub use updater::{CatalogConfig, UpdaterConfig};
