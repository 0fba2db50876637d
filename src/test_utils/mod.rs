//! Test utilities for launchpad.
//!
//! Available to unit tests and, through the `test-utils` feature, to the integration
//! suite.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::updater::ProcessControl;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=launchpad_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// [`ProcessControl`] that records calls instead of spawning or exiting.
#[derive(Debug, Default)]
pub struct RecordingProcess {
    spawned: Mutex<Vec<(PathBuf, Vec<String>)>>,
    exits: Mutex<Vec<i32>>,
    fail_spawn: bool,
}

impl RecordingProcess {
    /// A control whose every spawn fails with `PermissionDenied`.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    /// Programs started so far, with their arguments.
    pub fn spawned(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.spawned.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Exit codes requested so far.
    pub fn exits(&self) -> Vec<i32> {
        self.exits.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProcessControl for RecordingProcess {
    fn spawn_detached(&self, program: &Path, args: &[String]) -> std::io::Result<()> {
        if self.fail_spawn {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "spawn denied"));
        }
        if let Ok(mut spawned) = self.spawned.lock() {
            spawned.push((program.to_path_buf(), args.to_vec()));
        }
        Ok(())
    }

    fn exit(&self, code: i32) {
        if let Ok(mut exits) = self.exits.lock() {
            exits.push(code);
        }
    }
}
