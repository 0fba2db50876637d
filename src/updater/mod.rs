//! Self-update: manifest discovery, loop-guarded decisions, download, install.
//!
//! # Flow
//!
//! ```text
//! Scheduler ──► ManifestFetcher ──► decide() (loop guard) ──► EventSink
//!                                         │
//!                         install(url, v) ▼
//!             SkipMarker := v ──► Downloader ──► ChecksumVerifier ──► InstallSequencer
//! ```
//!
//! [`UpdateOrchestrator`] ties the pieces together; [`Scheduler`] drives it.
//!
//! # Loop guard
//!
//! Before downloading version `v` the orchestrator writes `v` to the skip marker. If the
//! installer fails silently and the launcher comes back at the old version, the next
//! check sees manifest == marker and reports no update instead of reinstalling forever.
//! The marker is cleared once the running version reaches it.

pub mod decision;
pub mod download;
pub mod events;
pub mod installer;
pub mod manifest;
pub mod orchestrator;
pub mod scheduler;
pub mod skip_marker;
pub mod verification;
pub mod version_cache;

pub use decision::{CheckOutcome, UpdateCheckResult, UpdateState};
pub use download::{DownloadProgress, Downloader};
pub use events::{ChannelSink, EventSink, LogSink, RecordingSink, UpdateEvent};
pub use installer::{InstallSequencer, ProcessControl, SystemProcessControl};
pub use manifest::{ManifestFetcher, VersionManifest};
pub use orchestrator::{InstallOutcome, UpdateOrchestrator};
pub use scheduler::{Scheduler, UpdateCycle};
pub use skip_marker::SkipMarkerStore;
pub use verification::ChecksumVerifier;
pub use version_cache::{VersionCacheStore, VersionCheckCache};
