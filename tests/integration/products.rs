//! Product catalog, artifact cache and launch working together.

use crate::common::{INSTALLER_BYTES, UpdateHarness};
use launchpad_cli::cache::{ArtifactCache, launch};
use launchpad_cli::catalog::CatalogStore;
use launchpad_cli::net::HttpClient;
use launchpad_cli::updater::{Downloader, ManifestFetcher};
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

fn http() -> HttpClient {
    HttpClient::new(Duration::from_secs(5), 5).unwrap()
}

#[tokio::test]
async fn test_sync_download_and_launch_product() {
    let mut h = UpdateHarness::new().await;
    let catalog_url = format!("{}/loader_versions.json", h.server.url());
    let artifact_url = format!("{}/files/sandbox.exe", h.server.url());
    let _catalog = h
        .server
        .mock("GET", "/loader_versions.json")
        .match_query(Matcher::Any)
        .with_body(
            json!({
                "sandbox": {
                    "DisplayName": "Sandbox",
                    "Category": "Tools",
                    "Version": "3.1.0",
                    "DownloadUrl": artifact_url,
                    "OriginalFileName": "sandbox.exe"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let artifact = h
        .server
        .mock("GET", "/files/sandbox.exe")
        .with_body(INSTALLER_BYTES)
        .expect(1)
        .create_async()
        .await;

    let products_dir = h.data_dir().join("products");
    let store = CatalogStore::new(h.data_dir(), products_dir.clone(), ManifestFetcher::new(http()));
    let products = store.list(Some(&catalog_url)).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Sandbox");
    assert!(!products[0].is_downloaded);
    assert!(products_dir.join("sandbox").is_dir());

    let cache = ArtifactCache::new(h.data_dir(), Downloader::new(http()));
    let url = products[0].download_url.clone().unwrap();
    let first = cache.fetch("sandbox", &url, "sandbox.exe", |_| {}).await.unwrap();
    let second = cache.fetch("sandbox", &url, "sandbox.exe", |_| {}).await.unwrap();
    artifact.assert_async().await;
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(std::fs::read(&first.path).unwrap(), INSTALLER_BYTES);

    launch(h.process.as_ref(), &first.path, &[]).unwrap();
    assert_eq!(h.process.spawned(), vec![(first.path.clone(), Vec::new())]);

    assert_eq!(cache.size().await.unwrap(), INSTALLER_BYTES.len() as u64);
    assert_eq!(cache.clear().await.unwrap(), 1);
    assert!(!first.path.exists());
}

#[tokio::test]
async fn test_outdated_after_remote_release() {
    let mut h = UpdateHarness::new().await;
    let catalog_url = format!("{}/loader_versions.json", h.server.url());
    let old = h
        .server
        .mock("GET", "/loader_versions.json")
        .match_query(Matcher::Any)
        .with_body(json!({"a": {"Version": "1.0"}, "b": {"Version": "2.0"}}).to_string())
        .create_async()
        .await;

    let store = CatalogStore::new(h.data_dir(), h.data_dir().join("products"), ManifestFetcher::new(http()));
    store.sync(&catalog_url).await.unwrap();
    old.remove_async().await;

    let _new = h
        .server
        .mock("GET", "/loader_versions.json")
        .match_query(Matcher::Any)
        .with_body(
            json!({"a": {"Version": "1.1"}, "b": {"Version": "2.0"}, "c": {"Version": "0.1"}})
                .to_string(),
        )
        .create_async()
        .await;

    let report = store.outdated(&catalog_url).await.unwrap();
    assert!(report.updates_available());
    let changed: Vec<_> =
        report.updates.iter().map(|u| (u.id.as_str(), u.old_version.as_deref())).collect();
    assert_eq!(changed, vec![("a", Some("1.0")), ("c", None)]);
}
