//! Check and install lifecycle, including the skip-marker loop guard.

use crate::common::{INSTALLER_BYTES, UpdateHarness, sha256_hex, slow_http_server};
use base64::Engine;
use launchpad_cli::updater::{CheckOutcome, EventSink, UpdateEvent};
use mockito::Matcher;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_check_offers_newer_version() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("2.0.0", None).await;

    let result = h.orchestrator("1.9.5").check().await;

    assert_eq!(result.outcome, CheckOutcome::UpdateAvailable);
    assert_eq!(result.current_version, "1.9.5");
    assert_eq!(result.latest_version.as_deref(), Some("2.0.0"));
    assert_eq!(result.download_url, Some(h.installer_url()));
    assert_eq!(result.changelog, vec!["Release 2.0.0".to_string()]);
    assert_eq!(h.sink.names(), vec!["checking", "available"]);
    assert_eq!(h.marker(), None);
    assert!(h.data_dir().join("version_cache.json").exists());
}

#[tokio::test]
async fn test_check_when_up_to_date() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("2.0.0", None).await;

    let result = h.orchestrator("2.0.0").check().await;

    assert_eq!(result.outcome, CheckOutcome::NoUpdate);
    assert!(!result.is_update_available());
    assert_eq!(result.download_url, None);
    assert_eq!(h.sink.names(), vec!["checking", "not-available"]);
}

#[tokio::test]
async fn test_check_sends_no_cache_headers() {
    let mut h = UpdateHarness::new().await;
    let mock = h
        .server
        .mock("GET", "/version.json")
        .match_query(Matcher::Regex("_=\\d+".to_string()))
        .match_header("cache-control", Matcher::Regex("no-cache".to_string()))
        .match_header("pragma", "no-cache")
        .with_body(json!({"version": "1.0.1", "downloadUrl": h.installer_url()}).to_string())
        .create_async()
        .await;

    let result = h.orchestrator("1.0.0").check().await;

    mock.assert_async().await;
    assert_eq!(result.outcome, CheckOutcome::UpdateAvailable);
}

#[tokio::test]
async fn test_check_unwraps_hosting_envelope() {
    let mut h = UpdateHarness::new().await;
    let inner = json!({"version": "3.0.0", "downloadUrl": h.installer_url()}).to_string();
    let encoded = base64::engine::general_purpose::STANDARD.encode(inner);
    // hosting APIs wrap the payload every 60 columns
    let wrapped: String = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    let _mock = h
        .server
        .mock("GET", "/version.json")
        .match_query(Matcher::Any)
        .with_body(json!({"content": wrapped, "encoding": "base64"}).to_string())
        .create_async()
        .await;

    let result = h.orchestrator("2.5.0").check().await;
    assert_eq!(result.latest_version.as_deref(), Some("3.0.0"));
    assert_eq!(result.outcome, CheckOutcome::UpdateAvailable);
}

#[tokio::test]
async fn test_check_follows_manifest_redirect() {
    let mut h = UpdateHarness::new().await;
    let _hop = h
        .server
        .mock("GET", "/version.json")
        .match_query(Matcher::Any)
        .with_status(302)
        .with_header("location", "/mirror/version.json")
        .create_async()
        .await;
    let _target = h
        .server
        .mock("GET", "/mirror/version.json")
        .match_query(Matcher::Any)
        .with_body(json!({"version": "1.2.0", "downloadUrl": h.installer_url()}).to_string())
        .create_async()
        .await;

    let result = h.orchestrator("1.1.0").check().await;
    assert_eq!(result.latest_version.as_deref(), Some("1.2.0"));
}

#[tokio::test]
async fn test_failed_check_leaves_marker_alone() {
    let mut h = UpdateHarness::new().await;
    h.write_marker("1.5.0");
    let _mock = h
        .server
        .mock("GET", "/version.json")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let result = h.orchestrator("1.0.0").check().await;

    assert_eq!(result.outcome, CheckOutcome::Error);
    assert!(result.error.as_deref().is_some_and(|e| e.contains("500")));
    assert_eq!(h.sink.names(), vec!["checking", "error"]);
    assert_eq!(h.marker().as_deref(), Some("1.5.0"));
}

#[tokio::test]
async fn test_malformed_manifest_is_an_error() {
    let mut h = UpdateHarness::new().await;
    let _mock = h
        .server
        .mock("GET", "/version.json")
        .match_query(Matcher::Any)
        .with_body("<html>rate limited</html>")
        .create_async()
        .await;

    let result = h.orchestrator("1.0.0").check().await;
    assert_eq!(result.outcome, CheckOutcome::Error);
    assert!(matches!(h.sink.events().last(), Some(UpdateEvent::Error { .. })));
}

#[tokio::test]
async fn test_missing_manifest_url_is_an_error() {
    let h = UpdateHarness::new().await;
    let mut config = h.config();
    config.manifest_url = None;

    let result = h.orchestrator_with(config, "1.0.0", h.sink.clone()).check().await;
    assert_eq!(result.outcome, CheckOutcome::Error);
    assert!(result.error.unwrap().contains("manifest_url"));
}

#[tokio::test]
async fn test_install_runs_installer_and_relaunches() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("2.0.0", Some(&sha256_hex(INSTALLER_BYTES))).await;
    let installer = h.serve_installer().await;

    let orchestrator = h.orchestrator("1.9.5");
    let result = orchestrator.check().await;
    let outcome = orchestrator
        .install(result.download_url.as_deref().unwrap(), result.latest_version.as_deref())
        .await;

    installer.assert_async().await;
    assert!(outcome.success, "{outcome:?}");
    assert_eq!(h.marker().as_deref(), Some("2.0.0"));
    assert_eq!(
        h.process.spawned(),
        vec![
            (h.artifact_path(), vec!["/S".to_string()]),
            (h.primary_executable(), Vec::new()),
        ]
    );
    assert_eq!(h.process.exits(), vec![0]);
    assert!(!h.artifact_path().exists());
    assert!(!h.data_dir().join("version_cache.json").exists());
    assert_eq!(
        h.sink.names(),
        vec!["checking", "available", "downloading", "progress", "downloaded"]
    );
}

/// Reads the skip marker the first time download progress is reported.
struct MarkerProbe {
    marker_path: PathBuf,
    seen: Mutex<Option<Option<String>>>,
}

impl EventSink for MarkerProbe {
    fn notify(&self, event: UpdateEvent) {
        if matches!(event, UpdateEvent::Progress { .. })
            && let Ok(mut seen) = self.seen.lock()
            && seen.is_none()
        {
            *seen = Some(std::fs::read_to_string(&self.marker_path).ok());
        }
    }
}

#[tokio::test]
async fn test_marker_is_written_before_download() {
    let mut h = UpdateHarness::new().await;
    let _installer = h.serve_installer().await;
    let probe = Arc::new(MarkerProbe {
        marker_path: h.data_dir().join("skip_version.txt"),
        seen: Mutex::new(None),
    });

    let orchestrator = h.orchestrator_with(h.config(), "1.9.5", probe.clone());
    let outcome = orchestrator.install(&h.installer_url(), Some("2.0.0")).await;

    assert!(outcome.success);
    let seen = probe.seen.lock().unwrap().clone();
    assert_eq!(seen, Some(Some("2.0.0".to_string())));
}

#[tokio::test]
async fn test_failed_install_is_not_retried() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("1.1.0", None).await;
    let _installer = h.serve_installer().await;

    // installer "runs" but the launcher comes back at the old version
    let first = h.orchestrator("1.0.0");
    let result = first.check().await;
    assert_eq!(result.outcome, CheckOutcome::UpdateAvailable);
    assert!(first.install(&h.installer_url(), Some("1.1.0")).await.success);
    assert_eq!(h.marker().as_deref(), Some("1.1.0"));

    let restarted = h.orchestrator("1.0.0");
    let result = restarted.check().await;

    assert_eq!(result.outcome, CheckOutcome::Skipped);
    assert!(!result.is_update_available());
    assert_eq!(result.download_url, None);
    assert_eq!(h.marker().as_deref(), Some("1.1.0"));
    assert_eq!(h.sink.names().last(), Some(&"not-available"));
}

#[tokio::test]
async fn test_successful_update_clears_marker_and_offers_next() {
    let mut h = UpdateHarness::new().await;
    h.write_marker("1.1.0");
    let _manifest = h.serve_manifest("1.2.0", None).await;

    let result = h.orchestrator("1.1.0").check().await;

    assert_eq!(result.outcome, CheckOutcome::UpdateAvailable);
    assert_eq!(result.latest_version.as_deref(), Some("1.2.0"));
    assert_eq!(h.marker(), None);
}

#[tokio::test]
async fn test_marker_cleared_when_running_version_reaches_it() {
    let mut h = UpdateHarness::new().await;
    h.write_marker("1.1.0");
    let _manifest = h.serve_manifest("1.1.0", None).await;

    let result = h.orchestrator("1.1.0").check().await;

    assert_eq!(result.outcome, CheckOutcome::NoUpdate);
    assert_eq!(h.marker(), None);
}

#[tokio::test]
async fn test_newer_release_after_skip_is_offered() {
    let mut h = UpdateHarness::new().await;
    h.write_marker("1.1.0");
    let _manifest = h.serve_manifest("1.2.0", None).await;

    let result = h.orchestrator("1.0.0").check().await;

    assert_eq!(result.outcome, CheckOutcome::UpdateAvailable);
    assert_eq!(h.marker().as_deref(), Some("1.1.0"));
}

#[tokio::test]
async fn test_checksum_mismatch_aborts_install() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("2.0.0", Some(&sha256_hex(b"something else"))).await;
    let _installer = h.serve_installer().await;

    let orchestrator = h.orchestrator("1.0.0");
    orchestrator.check().await;
    let outcome = orchestrator.install(&h.installer_url(), Some("2.0.0")).await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().to_lowercase().contains("checksum"));
    assert_eq!(h.marker().as_deref(), Some("2.0.0"));
    assert!(!h.artifact_path().exists());
    assert!(h.process.spawned().is_empty());
    assert!(h.process.exits().is_empty());
}

#[tokio::test]
async fn test_install_without_target_does_nothing() {
    let mut h = UpdateHarness::new().await;
    let installer = h.server.mock("GET", "/downloads/setup.exe").expect(0).create_async().await;

    let outcome = h.orchestrator("1.0.0").install(&h.installer_url(), None).await;

    installer.assert_async().await;
    assert!(!outcome.success);
    assert_eq!(h.marker(), None);
    assert!(h.sink.events().is_empty());
}

#[tokio::test]
async fn test_install_of_running_version_only_sets_marker() {
    let mut h = UpdateHarness::new().await;
    let installer = h.server.mock("GET", "/downloads/setup.exe").expect(0).create_async().await;

    let outcome = h.orchestrator("1.0.0").install(&h.installer_url(), Some("1.0.0")).await;

    installer.assert_async().await;
    assert!(!outcome.success);
    assert_eq!(h.marker().as_deref(), Some("1.0.0"));
    assert!(h.process.spawned().is_empty());
}

#[tokio::test]
async fn test_download_failure_keeps_marker() {
    let mut h = UpdateHarness::new().await;
    let _installer = h.server.mock("GET", "/downloads/setup.exe").with_status(404).create_async().await;

    let outcome = h.orchestrator("1.0.0").install(&h.installer_url(), Some("2.0.0")).await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("404"));
    assert_eq!(h.marker().as_deref(), Some("2.0.0"));
    assert_eq!(h.sink.names(), vec!["downloading", "error"]);
    assert!(!h.artifact_path().exists());
}

#[tokio::test]
async fn test_concurrent_install_is_rejected() {
    let h = UpdateHarness::new().await;
    let url = format!("{}/setup.exe", slow_http_server(INSTALLER_BYTES.to_vec(), Duration::from_millis(400)));
    let orchestrator = h.orchestrator("1.0.0");

    let (first, second) = tokio::join!(orchestrator.install(&url, Some("2.0.0")), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        orchestrator.install(&url, Some("2.0.0")).await
    });

    assert!(first.success, "{first:?}");
    assert!(!second.success);
    assert!(second.error.unwrap().contains("already in progress"));
    assert_eq!(h.process.exits(), vec![0]);
}

#[tokio::test]
async fn test_auto_install_cycle() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("2.0.0", None).await;
    let _installer = h.serve_installer().await;
    let mut config = h.config();
    config.auto_install = true;

    let orchestrator = h
        .orchestrator_with(config, "1.0.0", h.sink.clone())
        .with_relaunch_args(vec!["run".to_string()]);
    let result = orchestrator.check_and_maybe_install().await.unwrap();

    assert_eq!(result.outcome, CheckOutcome::UpdateAvailable);
    assert_eq!(h.marker().as_deref(), Some("2.0.0"));
    assert_eq!(h.process.spawned()[1], (h.primary_executable(), vec!["run".to_string()]));
}
