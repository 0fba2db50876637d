//! Shared fixtures for the integration suite: a mock update server, a scratch data
//! directory and recording stand-ins for events and process control.

// not every helper is used by every test file
#![allow(dead_code)]

use launchpad_cli::config::UpdaterConfig;
use launchpad_cli::test_utils::RecordingProcess;
use launchpad_cli::updater::{EventSink, RecordingSink, UpdateOrchestrator};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const INSTALLER_BYTES: &[u8] = b"MZ fake installer payload";

/// Mock server plus everything an orchestrator under test touches.
pub struct UpdateHarness {
    pub server: ServerGuard,
    pub temp: TempDir,
    pub sink: Arc<RecordingSink>,
    pub process: Arc<RecordingProcess>,
}

impl UpdateHarness {
    pub async fn new() -> Self {
        launchpad_cli::test_utils::init_test_logging(None);
        let temp = TempDir::new().expect("temp dir");
        std::fs::write(temp.path().join("launchpad.exe"), b"launcher").expect("primary exe");
        Self {
            server: mockito::Server::new_async().await,
            temp,
            sink: Arc::new(RecordingSink::new()),
            process: Arc::new(RecordingProcess::default()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/version.json", self.server.url())
    }

    pub fn installer_url(&self) -> String {
        format!("{}/downloads/setup.exe", self.server.url())
    }

    pub fn primary_executable(&self) -> PathBuf {
        self.temp.path().join("launchpad.exe")
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.temp.path().join("update-setup.exe")
    }

    pub fn config(&self) -> UpdaterConfig {
        UpdaterConfig {
            manifest_url: Some(self.manifest_url()),
            install_settle_secs: 0,
            exit_delay_ms: 0,
            request_timeout_secs: 5,
            primary_executable: Some(self.primary_executable()),
            ..UpdaterConfig::default()
        }
    }

    pub fn orchestrator(&self, current_version: &str) -> UpdateOrchestrator {
        self.orchestrator_with(self.config(), current_version, self.sink.clone())
    }

    pub fn orchestrator_with(
        &self,
        config: UpdaterConfig,
        current_version: &str,
        sink: Arc<dyn EventSink>,
    ) -> UpdateOrchestrator {
        UpdateOrchestrator::new(config, self.data_dir(), current_version, sink, self.process.clone())
            .expect("orchestrator")
            .with_artifact_path(self.artifact_path())
    }

    /// Serve a manifest for `version` pointing at [`Self::installer_url`].
    pub async fn serve_manifest(&mut self, version: &str, sha256: Option<&str>) -> Mock {
        let mut body = json!({
            "version": version,
            "downloadUrl": self.installer_url(),
            "changelog": [format!("Release {version}")],
        });
        if let Some(sha) = sha256 {
            body["sha256"] = json!(sha);
        }
        self.server
            .mock("GET", "/version.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    pub async fn serve_installer(&mut self) -> Mock {
        self.server
            .mock("GET", "/downloads/setup.exe")
            .with_status(200)
            .with_body(INSTALLER_BYTES)
            .create_async()
            .await
    }

    /// Skip marker as stored on disk.
    pub fn marker(&self) -> Option<String> {
        std::fs::read_to_string(self.data_dir().join("skip_version.txt"))
            .ok()
            .map(|s| s.trim().to_string())
    }

    pub fn write_marker(&self, version: &str) {
        std::fs::write(self.data_dir().join("skip_version.txt"), version).expect("write marker");
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Answer a single HTTP request with `body` after `delay`. Returns the base URL.
pub fn slow_http_server(body: Vec<u8>, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            std::thread::sleep(delay);
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
    });
    format!("http://{addr}")
}
