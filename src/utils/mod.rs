//! Cross-platform utilities.
//!
//! - [`backoff`] - exponential backoff for polling loops
//! - [`fs`] - atomic writes, directory creation, best-effort removal
//! - [`lock`] - advisory file locks for state shared between processes
//! - [`platform`] - path expansion, data directories, detached process spawning
//! - [`progress`] - progress bars and spinners

pub mod backoff;
pub mod fs;
pub mod lock;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, remove_file_best_effort, remove_file_if_exists};
pub use lock::FileLock;
pub use platform::{get_data_dir, get_home_dir, is_windows, resolve_path, spawn_detached};
pub use progress::{ProgressBar, ProgressStyle};
