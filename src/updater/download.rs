//! Streaming downloads with progress reporting.
//!
//! The destination is owned by the [`Downloader`] for the duration of a download: any
//! existing file is deleted first, bytes are streamed straight to disk, and on any
//! failure the partial file is deleted before the error is returned. Afterwards the
//! destination is either complete or absent.

use crate::core::{LauncherError, Result};
use crate::net::HttpClient;
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Progress of an in-flight download. Produced per received chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DownloadProgress {
    /// `0.0..=100.0`, or `None` when the server sent no `Content-Length`.
    pub percent: Option<f64>,
    pub transferred: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    #[must_use]
    pub fn new(transferred: u64, total: Option<u64>) -> Self {
        let percent = total.filter(|t| *t > 0).map(|t| {
            #[allow(clippy::cast_precision_loss)]
            let pct = transferred as f64 / t as f64 * 100.0;
            pct.min(100.0)
        });
        Self {
            percent,
            transferred,
            total,
        }
    }
}

/// Streams remote binaries to local files.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: HttpClient,
}

impl Downloader {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self {
            http,
        }
    }

    /// Download `url` to `dest`, calling `on_progress` after every chunk.
    ///
    /// # Errors
    ///
    /// - [`LauncherError::HttpStatusError`] for a non-200 terminal response
    /// - [`LauncherError::NetworkError`] on transport failure, including a stream that
    ///   ends before `Content-Length` bytes arrived
    /// - [`LauncherError::RedirectLoopError`] past the redirect bound
    /// - [`LauncherError::IoError`] for filesystem failures
    pub async fn download<F>(&self, url: &str, dest: &Path, mut on_progress: F) -> Result<PathBuf>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        crate::utils::remove_file_if_exists(dest).await?;
        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        match self.stream_to_file(url, dest, &mut on_progress).await {
            Ok(bytes) => {
                debug!(url, dest = %dest.display(), bytes, "download complete");
                Ok(dest.to_path_buf())
            }
            Err(e) => {
                warn!(url, error = %e, "download failed, removing partial file");
                crate::utils::remove_file_best_effort(dest).await;
                Err(e)
            }
        }
    }

    async fn stream_to_file<F>(&self, url: &str, dest: &Path, on_progress: &mut F) -> Result<u64>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        let response = self.http.get(url, &HeaderMap::new()).await?;
        if response.status() != StatusCode::OK {
            return Err(LauncherError::HttpStatusError {
                url: response.url().to_string(),
                code: response.status().as_u16(),
            });
        }

        let total = response.content_length();
        let mut file = tokio::fs::File::create(dest).await?;
        let mut transferred: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LauncherError::network(format!("downloading {url}"), e))?;
            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            on_progress(DownloadProgress::new(transferred, total));
        }

        if let Some(expected) = total
            && transferred < expected
        {
            return Err(LauncherError::network(
                format!("downloading {url}"),
                format!("connection closed after {transferred} of {expected} bytes"),
            ));
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(transferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn downloader() -> Downloader {
        Downloader::new(HttpClient::new(Duration::from_secs(5), 5).unwrap())
    }

    #[test]
    fn test_progress_percent() {
        let p = DownloadProgress::new(50, Some(200));
        assert_eq!(p.percent, Some(25.0));
        assert_eq!(DownloadProgress::new(10, None).percent, None);
        assert_eq!(DownloadProgress::new(10, Some(0)).percent, None);
    }

    #[tokio::test]
    async fn test_download_reports_progress() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("artifact.bin");
        let body = vec![7u8; 64 * 1024];

        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/artifact.bin").with_status(200).with_body(&body).create_async().await;

        let mut events = Vec::new();
        let path = downloader()
            .download(&format!("{}/artifact.bin", server.url()), &dest, |p| events.push(p))
            .await
            .unwrap();

        assert_eq!(path, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        let last = events.last().unwrap();
        assert_eq!(last.transferred, body.len() as u64);
        assert_eq!(last.total, Some(body.len() as u64));
        assert_eq!(last.percent, Some(100.0));
        assert!(events.windows(2).all(|w| w[0].transferred <= w[1].transferred));
    }

    #[tokio::test]
    async fn test_redirect_chain_of_three_resolves() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("setup.exe");

        let mut server = mockito::Server::new_async().await;
        let _a = server.mock("GET", "/a").with_status(302).with_header("location", "/b").create_async().await;
        let _b = server.mock("GET", "/b").with_status(302).with_header("location", "/c").create_async().await;
        let _c = server.mock("GET", "/c").with_status(302).with_header("location", "/file").create_async().await;
        let _f = server.mock("GET", "/file").with_status(200).with_body("payload").create_async().await;

        downloader().download(&format!("{}/a", server.url()), &dest, |_| {}).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_redirect_past_bound_fails() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("setup.exe");

        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for i in 0..6 {
            let mock = server
                .mock("GET", format!("/r{i}").as_str())
                .with_status(302)
                .with_header("location", &format!("/r{}", i + 1))
                .create_async()
                .await;
            mocks.push(mock);
        }

        let err = downloader().download(&format!("{}/r0", server.url()), &dest, |_| {}).await.unwrap_err();
        assert!(matches!(err, LauncherError::RedirectLoopError { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_non_200_status() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("setup.exe");

        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/missing").with_status(404).create_async().await;

        let err = downloader()
            .download(&format!("{}/missing", server.url()), &dest, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::HttpStatusError { code: 404, .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_existing_destination_is_replaced() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("setup.exe");
        std::fs::write(&dest, "stale content that is longer").unwrap();

        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/new").with_status(200).with_body("fresh").create_async().await;

        downloader().download(&format!("{}/new", server.url()), &dest, |_| {}).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_interrupted_stream_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("setup.exe");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n";
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&[1u8; 4096]).await.unwrap();
            socket.flush().await.unwrap();
            // drop closes the connection mid-body
        });

        let mut seen = 0u64;
        let err = downloader()
            .download(&format!("http://{addr}/setup.exe"), &dest, |p| seen = p.transferred)
            .await
            .unwrap_err();

        assert!(err.is_network(), "{err:?}");
        assert!(seen <= 4096);
        assert!(!dest.exists());
    }
}
