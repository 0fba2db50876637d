//! Scheduler driving a real orchestrator.

use crate::common::{UpdateHarness, slow_http_server};
use launchpad_cli::updater::{Scheduler, UpdateEvent};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn checks(h: &UpdateHarness) -> usize {
    h.sink.events().iter().filter(|e| matches!(e, UpdateEvent::Checking)).count()
}

#[tokio::test]
async fn test_startup_check_reports_update() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("2.0.0", None).await;

    let orchestrator = Arc::new(h.orchestrator("1.0.0"));
    let scheduler = Scheduler::new(orchestrator, Some(Duration::from_millis(20)), None);
    scheduler.start();
    tokio::time::sleep(Duration::from_millis(500)).await;
    scheduler.stop().await;

    assert_eq!(h.sink.names(), vec!["checking", "available"]);
    assert!(h.process.spawned().is_empty());
}

#[tokio::test]
async fn test_overlapping_cycles_are_dropped() {
    let h = UpdateHarness::new().await;
    let body = json!({"version": "1.0.0", "downloadUrl": "https://example.com/setup.exe"});
    let base = slow_http_server(body.to_string().into_bytes(), Duration::from_millis(400));
    let mut config = h.config();
    config.manifest_url = Some(format!("{base}/version.json"));

    let orchestrator = Arc::new(h.orchestrator_with(config, "1.0.0", h.sink.clone()));
    let scheduler = Scheduler::new(orchestrator, None, None);
    scheduler.start();
    for _ in 0..3 {
        scheduler.trigger();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(700)).await;
    scheduler.stop().await;

    assert_eq!(checks(&h), 1);
    assert_eq!(h.sink.names(), vec!["checking", "not-available"]);
}

#[tokio::test]
async fn test_interval_checks_repeat() {
    let mut h = UpdateHarness::new().await;
    let _manifest = h.serve_manifest("1.0.0", None).await;

    let orchestrator = Arc::new(h.orchestrator("1.0.0"));
    let scheduler = Scheduler::new(orchestrator, None, Some(Duration::from_millis(100)));
    scheduler.start();
    tokio::time::sleep(Duration::from_millis(450)).await;
    scheduler.stop().await;

    assert!(checks(&h) >= 2, "ran {} checks", checks(&h));
}
