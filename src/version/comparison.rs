//! Dotted-numeric version comparison.
//!
//! Launcher manifests advertise versions as plain dotted numbers (`1.2.0`, `2.0`,
//! `1.10.3.7`). These are compared component-wise as integers, with missing trailing
//! components treated as zero, so `1.10.0 > 1.9.0` and `1.2 == 1.2.0`.
//!
//! Malformed versions are rejected with
//! [`LauncherError::InvalidVersionError`](crate::core::LauncherError::InvalidVersionError)
//! instead of being coerced to zero: a corrupt manifest must not look like an older
//! release.
//!
//! # Examples
//!
//! ```rust
//! use launchpad_cli::version::comparison::VersionComparator;
//! use std::cmp::Ordering;
//!
//! # fn example() -> launchpad_cli::core::Result<()> {
//! assert_eq!(VersionComparator::compare("1.2.0", "1.10.0")?, Ordering::Less);
//! assert_eq!(VersionComparator::compare("1.2", "1.2.0")?, Ordering::Equal);
//! assert!(VersionComparator::is_newer("2.0.0", "1.9.5")?);
//! # Ok(())
//! # }
//! ```

use crate::core::{LauncherError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed dotted-numeric version.
///
/// Equality and ordering ignore trailing zero components, so `1.2` and `1.2.0` compare
/// equal. The original string is kept for display.
#[derive(Debug, Clone)]
pub struct DottedVersion {
    raw: String,
    parts: Vec<u64>,
}

impl DottedVersion {
    /// Parse a version string.
    ///
    /// Surrounding whitespace and a single leading `v`/`V` are ignored. Every segment
    /// must be a non-empty run of ASCII digits that fits in a `u64`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

        if body.is_empty() {
            return Err(LauncherError::InvalidVersionError {
                version: input.to_string(),
                reason: "version is empty".to_string(),
            });
        }

        let parts = body
            .split('.')
            .enumerate()
            .map(|(idx, segment)| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(LauncherError::InvalidVersionError {
                        version: input.to_string(),
                        reason: format!("segment {} ('{segment}') is not a number", idx + 1),
                    });
                }
                segment.parse::<u64>().map_err(|e| LauncherError::InvalidVersionError {
                    version: input.to_string(),
                    reason: format!("segment {} ('{segment}'): {e}", idx + 1),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: trimmed.to_string(),
            parts,
        })
    }

    /// Numeric components as parsed, without normalisation.
    #[must_use]
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// The version as originally written (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn component(&self, idx: usize) -> u64 {
        self.parts.get(idx).copied().unwrap_or(0)
    }
}

impl FromStr for DottedVersion {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for DottedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for DottedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DottedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DottedVersion {}

/// String-level comparison helpers used by the update decision logic.
pub struct VersionComparator;

impl VersionComparator {
    /// Compare two version strings.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::InvalidVersionError`] if either side has a non-numeric
    /// or empty segment.
    pub fn compare(a: &str, b: &str) -> Result<Ordering> {
        Ok(DottedVersion::parse(a)?.cmp(&DottedVersion::parse(b)?))
    }

    /// `true` if `candidate` is strictly newer than `current`.
    pub fn is_newer(candidate: &str, current: &str) -> Result<bool> {
        Ok(Self::compare(candidate, current)? == Ordering::Greater)
    }

    /// `true` if `a` and `b` denote the same version (`1.2` == `1.2.0`).
    pub fn is_same(a: &str, b: &str) -> Result<bool> {
        Ok(Self::compare(a, b)? == Ordering::Equal)
    }

    /// `true` if `current` is at least `required`.
    pub fn is_at_least(current: &str, required: &str) -> Result<bool> {
        Ok(Self::compare(current, required)? != Ordering::Less)
    }
}
