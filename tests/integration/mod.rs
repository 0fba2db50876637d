//! Integration test suite for launchpad
//!
//! End-to-end tests against a local mock HTTP server. Nothing here spawns real
//! installers or exits the test process: process control is replaced by
//! `test_utils::RecordingProcess`.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **self_update**: check/install lifecycle and the skip-marker loop guard
//! - **scheduler**: scheduled cycles against a real orchestrator
//! - **products**: catalog sync and artifact cache
//! - **cli**: the `launchpad` binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod products;
mod scheduler;
mod self_update;
