//! Error handling for launchpad
//!
//! This module provides the strongly-typed error taxonomy used by the update
//! orchestrator and user-friendly error reporting for the CLI. The error system is
//! designed around two core principles:
//! 1. **Strongly-typed errors** so the orchestrator can map each failure to an outcome
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`LauncherError`] - Enumerated error types for every failure in a check or install cycle
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//!
//! # Error Categories
//!
//! - **Network**: [`LauncherError::NetworkError`], [`LauncherError::RedirectLoopError`]
//! - **Remote**: [`LauncherError::RemoteError`], [`LauncherError::HttpStatusError`]
//! - **Data**: [`LauncherError::DecodeError`], [`LauncherError::InvalidVersionError`]
//! - **Local**: [`LauncherError::IoError`], [`LauncherError::InstallLaunchError`]
//!
//! None of these errors crash the process. The orchestrator catches them at the top of
//! a check or install cycle and turns them into an `error` event.
//!
//! # Examples
//!
//! ```rust,no_run
//! use launchpad_cli::core::{LauncherError, ErrorContext, user_friendly_error};
//!
//! let error = LauncherError::RedirectLoopError {
//!     url: "https://example.com/manifest.json".to_string(),
//!     max: 5,
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Convenience result type for typed launcher operations.
pub type Result<T> = std::result::Result<T, LauncherError>;

/// The main error type for launcher operations.
///
/// Network-facing and update-cycle operations return this type directly so callers
/// can match on the failure mode. CLI glue wraps it in [`anyhow::Error`] and converts
/// back with [`user_friendly_error`] for display.
#[derive(Error, Debug)]
pub enum LauncherError {
    /// Connection, DNS, TLS or timeout failure.
    ///
    /// Retried only on the next scheduled tick, never immediately.
    #[error("Network error while {operation}: {reason}")]
    NetworkError {
        /// What was being attempted (e.g. "fetching manifest")
        operation: String,
        /// Underlying transport failure
        reason: String,
    },

    /// The manifest endpoint answered with a non-success status after redirects.
    #[error("Remote endpoint {url} returned HTTP {status}")]
    RemoteError {
        /// Final URL after redirects
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// A download answered with a non-200 terminal status.
    #[error("Download from {url} failed with HTTP {code}")]
    HttpStatusError {
        /// Final URL after redirects
        url: String,
        /// HTTP status code
        code: u16,
    },

    /// The response body was not valid structured data.
    #[error("Failed to decode {what}: {reason}")]
    DecodeError {
        /// What was being decoded (e.g. "version manifest")
        what: String,
        /// Parser message
        reason: String,
    },

    /// The redirect bound was exceeded.
    #[error("Too many redirects (more than {max}) starting at {url}")]
    RedirectLoopError {
        /// URL of the first request in the chain
        url: String,
        /// Configured redirect bound
        max: usize,
    },

    /// A version string contained a non-numeric or empty segment.
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersionError {
        /// The offending version string
        version: String,
        /// Which segment was rejected
        reason: String,
    },

    /// The installer artifact could not be invoked.
    #[error("Failed to launch installer {path}: {reason}")]
    InstallLaunchError {
        /// Path of the artifact
        path: String,
        /// OS error message
        reason: String,
    },

    /// The downloaded artifact did not match the manifest checksum.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Path of the artifact (already removed)
        path: String,
        /// Checksum advertised by the manifest
        expected: String,
        /// Checksum computed locally
        actual: String,
    },

    /// Configuration is missing a required value or is malformed.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Product catalog could not be read or written.
    #[error("Catalog error: {message}")]
    CatalogError {
        /// Description of the catalog problem
        message: String,
    },

    /// Filesystem failure (disk full, permission denied, ...).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl LauncherError {
    /// Build a [`LauncherError::NetworkError`] from a transport failure.
    pub fn network(operation: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::NetworkError {
            operation: operation.into(),
            reason: err.to_string(),
        }
    }

    /// Build a [`LauncherError::DecodeError`].
    pub fn decode(what: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::DecodeError {
            what: what.into(),
            reason: err.to_string(),
        }
    }

    /// Short machine-friendly name of the error kind, used in events and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NetworkError {
                ..
            } => "network",
            Self::RemoteError {
                ..
            } => "remote",
            Self::HttpStatusError {
                ..
            } => "http-status",
            Self::DecodeError {
                ..
            } => "decode",
            Self::RedirectLoopError {
                ..
            } => "redirect-loop",
            Self::InvalidVersionError {
                ..
            } => "invalid-version",
            Self::InstallLaunchError {
                ..
            } => "install-launch",
            Self::ChecksumMismatch {
                ..
            } => "checksum",
            Self::ConfigError {
                ..
            } => "config",
            Self::CatalogError {
                ..
            } => "catalog",
            Self::IoError(_) => "io",
            Self::Other {
                ..
            } => "other",
        }
    }

    /// Whether the failure is a connectivity problem the next scheduled tick may fix.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::NetworkError {
                ..
            } | Self::RedirectLoopError {
                ..
            }
        )
    }
}

impl Clone for LauncherError {
    fn clone(&self) -> Self {
        match self {
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::RemoteError {
                url,
                status,
            } => Self::RemoteError {
                url: url.clone(),
                status: *status,
            },
            Self::HttpStatusError {
                url,
                code,
            } => Self::HttpStatusError {
                url: url.clone(),
                code: *code,
            },
            Self::DecodeError {
                what,
                reason,
            } => Self::DecodeError {
                what: what.clone(),
                reason: reason.clone(),
            },
            Self::RedirectLoopError {
                url,
                max,
            } => Self::RedirectLoopError {
                url: url.clone(),
                max: *max,
            },
            Self::InvalidVersionError {
                version,
                reason,
            } => Self::InvalidVersionError {
                version: version.clone(),
                reason: reason.clone(),
            },
            Self::InstallLaunchError {
                path,
                reason,
            } => Self::InstallLaunchError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ChecksumMismatch {
                path,
                expected,
                actual,
            } => Self::ChecksumMismatch {
                path: path.clone(),
                expected: expected.clone(),
                actual: actual.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::CatalogError {
                message,
            } => Self::CatalogError {
                message: message.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying launcher error
    pub error: LauncherError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: LauncherError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions where we know the cause.
///
/// Typed [`LauncherError`]s anywhere in the chain get tailored suggestions; bare IO
/// errors are classified by kind; everything else is reported with its cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(launcher_error) = error.chain().find_map(|e| e.downcast_ref::<LauncherError>()) {
        return create_error_context(launcher_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(LauncherError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion(
                    "Check ownership of the launcher data directory or run with elevated permissions",
                );
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(LauncherError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(LauncherError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your launchpad config file")
        .with_details("Run `launchpad config path` to see which file was loaded");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(LauncherError::Other {
        message,
    })
}

fn create_error_context(error: LauncherError) -> ErrorContext {
    let (suggestion, details) = match &error {
        LauncherError::NetworkError {
            ..
        } => (
            Some("Check your internet connection; the next scheduled check will retry"),
            Some("The launcher stays usable while the update channel is unreachable"),
        ),
        LauncherError::RedirectLoopError {
            ..
        } => (
            Some("Verify the manifest or download URL points at the final location"),
            Some("Redirect chains are followed for a bounded number of hops only"),
        ),
        LauncherError::RemoteError {
            status: 404,
            ..
        } => (Some("Check `updater.manifest_url` in your config file"), None),
        LauncherError::RemoteError {
            ..
        }
        | LauncherError::HttpStatusError {
            ..
        } => (Some("The update server rejected the request; try again later"), None),
        LauncherError::DecodeError {
            ..
        } => (None, Some("The manifest must be JSON with `version`, `downloadUrl` and `changelog`")),
        LauncherError::InvalidVersionError {
            ..
        } => (None, Some("Versions must be dotted numbers such as 1.2.0")),
        LauncherError::InstallLaunchError {
            ..
        } => (
            Some("Run `launchpad skip clear` after fixing the installer to retry"),
            Some("The failed version stays skipped so it is not retried automatically"),
        ),
        LauncherError::ChecksumMismatch {
            ..
        } => (None, Some("The corrupted download was removed and the version is now skipped")),
        LauncherError::ConfigError {
            ..
        } => (Some("Run `launchpad config init` to write a config file with defaults"), None),
        _ => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}
