//! Remote version manifest retrieval.
//!
//! The manifest is a small JSON document:
//!
//! ```json
//! {
//!   "version": "2.0.0",
//!   "downloadUrl": "https://github.com/acme/launcher/releases/download/v2.0.0/setup.exe",
//!   "changelog": ["Faster downloads", "New catalog view"],
//!   "sha256": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
//! }
//! ```
//!
//! When served through a hosting API (e.g. the GitHub contents endpoint) the document is
//! wrapped in an envelope whose `content` field holds the base64-encoded, line-wrapped
//! JSON. Both shapes are accepted.

use crate::core::{LauncherError, Result};
use crate::net::HttpClient;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Query parameter carrying the cache-busting timestamp.
pub const CACHE_BUST_PARAM: &str = "_";

/// Latest published version as advertised by the remote manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub version: String,
    pub download_url: String,
    #[serde(default)]
    pub changelog: Vec<String>,
    /// Optional SHA-256 of the artifact, hex, with or without a `sha256:` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Fetches and decodes [`VersionManifest`]s. Stateless apart from the HTTP client.
#[derive(Debug, Clone)]
pub struct ManifestFetcher {
    http: HttpClient,
}

impl ManifestFetcher {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self {
            http,
        }
    }

    /// Fetch the manifest at `manifest_url`.
    ///
    /// Sends no-cache headers and a `_=<millis>` query parameter so CDN caches are
    /// bypassed.
    ///
    /// # Errors
    ///
    /// - [`LauncherError::NetworkError`] on transport failure
    /// - [`LauncherError::RedirectLoopError`] past the redirect bound
    /// - [`LauncherError::RemoteError`] for a non-success terminal status
    /// - [`LauncherError::DecodeError`] if the body is not a valid manifest
    pub async fn fetch(&self, manifest_url: &str) -> Result<VersionManifest> {
        let body = self.fetch_text(manifest_url, "fetching manifest").await?;
        let manifest = decode_manifest(&body)?;
        debug!(version = %manifest.version, url = %manifest.download_url, "fetched manifest");
        Ok(manifest)
    }

    /// Fetch any JSON document with the same cache-busting and envelope handling.
    pub async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T> {
        let body = self.fetch_text(url, what).await?;
        let value = unwrap_envelope(&body, what)?;
        serde_json::from_value(value).map_err(|e| LauncherError::decode(what, e))
    }

    async fn fetch_text(&self, url: &str, operation: &str) -> Result<String> {
        let busted = cache_busted_url(url, now_millis())?;

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store, must-revalidate"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let response = self.http.get(&busted, &headers).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::RemoteError {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| LauncherError::network(operation, e))
    }
}

fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default()
}

/// Append `_=<stamp>` to `url`, keeping any existing query.
pub fn cache_busted_url(url: &str, stamp: u128) -> Result<String> {
    let mut parsed =
        Url::parse(url).map_err(|e| LauncherError::network(format!("parsing URL {url}"), e))?;
    parsed.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &stamp.to_string());
    Ok(parsed.into())
}

/// Decode a manifest body, unwrapping a hosting-API envelope if present.
pub fn decode_manifest(body: &str) -> Result<VersionManifest> {
    let value = unwrap_envelope(body, "version manifest")?;
    let manifest: VersionManifest = serde_json::from_value(value)
        .map_err(|e| LauncherError::decode("version manifest", e))?;

    if manifest.version.trim().is_empty() {
        return Err(LauncherError::decode("version manifest", "`version` is empty"));
    }
    Ok(manifest)
}

/// Parse `body` as JSON; if it is an envelope with a string `content` field, decode that
/// instead.
fn unwrap_envelope(body: &str, what: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| LauncherError::decode(what, e))?;

    let Some(content) = value.get("content").and_then(serde_json::Value::as_str) else {
        return Ok(value);
    };

    let encoding = value.get("encoding").and_then(serde_json::Value::as_str).unwrap_or("base64");
    let inner = if encoding.eq_ignore_ascii_case("base64") {
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| LauncherError::decode(format!("{what} envelope"), e))?;
        String::from_utf8(bytes).map_err(|e| LauncherError::decode(format!("{what} envelope"), e))?
    } else {
        content.to_string()
    };

    debug!(encoding, "unwrapped hosting API envelope");
    serde_json::from_str(&inner).map_err(|e| LauncherError::decode(what, e))
}
