//! Core types shared across launchpad.
//!
//! Currently this is the error taxonomy and the user-facing error formatting. See
//! [`error`] for details.

pub mod error;

pub use error::{ErrorContext, LauncherError, Result, user_friendly_error};
