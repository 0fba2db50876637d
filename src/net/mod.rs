//! HTTP plumbing shared by the manifest fetcher, the downloader and the catalog.
//!
//! Redirects are followed manually instead of by reqwest's built-in policy so the hop
//! bound produces a typed [`LauncherError::RedirectLoopError`] and every hop is logged.

use crate::core::{LauncherError, Result};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("launchpad/", env!("CARGO_PKG_VERSION"));

/// HTTP client with a bounded, manually followed redirect chain.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_redirects: usize,
}

impl HttpClient {
    /// Build a client.
    ///
    /// `timeout` bounds connecting and each read, not the whole transfer, so large
    /// downloads on slow links are not cut off.
    pub fn new(timeout: Duration, max_redirects: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| LauncherError::network("building HTTP client", e))?;

        Ok(Self {
            client,
            max_redirects,
        })
    }

    #[must_use]
    pub const fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// `GET url`, following up to `max_redirects` redirects.
    ///
    /// Returns the terminal response, whatever its status. A 3xx without a `Location`
    /// header is terminal too.
    ///
    /// # Errors
    ///
    /// - [`LauncherError::NetworkError`] for transport failures or an unparseable URL
    /// - [`LauncherError::RedirectLoopError`] when the chain is longer than the bound
    pub async fn get(&self, url: &str, headers: &HeaderMap) -> Result<Response> {
        let mut current = Url::parse(url)
            .map_err(|e| LauncherError::network(format!("parsing URL {url}"), e))?;
        let mut hops = 0usize;

        loop {
            let response = self
                .client
                .get(current.clone())
                .headers(headers.clone())
                .send()
                .await
                .map_err(|e| LauncherError::network(format!("requesting {current}"), e))?;

            let Some(next) = redirect_target(&response, &current) else {
                return Ok(response);
            };

            hops += 1;
            if hops > self.max_redirects {
                return Err(LauncherError::RedirectLoopError {
                    url: url.to_string(),
                    max: self.max_redirects,
                });
            }
            debug!(from = %current, to = %next, hop = hops, "following redirect");
            current = next;
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Next URL for a redirect response, resolving relative `Location` values.
fn redirect_target(response: &Response, current: &Url) -> Option<Url> {
    if !is_redirect(response.status()) {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}
