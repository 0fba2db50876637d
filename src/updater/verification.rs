//! SHA-256 verification of downloaded artifacts.

use crate::core::{LauncherError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// SHA-256 of a file as lowercase hex, without prefix.
    pub async fn compute_sha256(file_path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {}", file_path.display());

        let mut file = tokio::fs::File::open(file_path).await?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Normalise an advertised checksum: trim, drop a `sha256:` prefix, lowercase.
    #[must_use]
    pub fn normalize(checksum: &str) -> String {
        let trimmed = checksum.trim();
        let bare = trimmed
            .get(..7)
            .filter(|p| p.eq_ignore_ascii_case("sha256:"))
            .map_or(trimmed, |_| &trimmed[7..]);
        bare.to_ascii_lowercase()
    }

    /// Compare the file's checksum against `expected` (case-insensitive).
    ///
    /// # Errors
    ///
    /// [`LauncherError::ChecksumMismatch`] if they differ; the file is left in place for
    /// the caller to remove.
    pub async fn verify_checksum(file_path: &Path, expected: &str) -> Result<()> {
        info!("Verifying checksum for: {}", file_path.display());

        let actual = Self::compute_sha256(file_path).await?;
        let expected = Self::normalize(expected);

        if actual != expected {
            return Err(LauncherError::ChecksumMismatch {
                path: file_path.display().to_string(),
                expected,
                actual,
            });
        }

        info!("Checksum verification successful");
        Ok(())
    }
}
