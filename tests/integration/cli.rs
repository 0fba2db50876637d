//! The `launchpad` binary, isolated through `LAUNCHPAD_CONFIG_PATH`.

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct CliEnv {
    temp: TempDir,
}

impl CliEnv {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    fn dir(&self) -> &Path {
        self.temp.path()
    }

    fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("launchpad").unwrap();
        cmd.env("LAUNCHPAD_CONFIG_PATH", self.config_path())
            .env("LAUNCHPAD_NO_PROGRESS", "1")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

#[test]
fn test_config_path_honours_env() {
    let env = CliEnv::new();
    env.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env.config_path().display().to_string()));
}

#[test]
fn test_config_init_and_show() {
    let env = CliEnv::new();
    env.cmd()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));
    assert!(env.config_path().exists());

    env.cmd()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    env.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[updater]"))
        .stdout(predicate::str::contains("manifest_url"));
}

#[test]
fn test_skip_set_show_clear() {
    let env = CliEnv::new();
    env.cmd().args(["skip", "show"]).assert().success().stdout(predicate::str::contains("No skip marker"));

    env.cmd().args(["skip", "set", "2.0.0"]).assert().success();
    assert_eq!(std::fs::read_to_string(env.dir().join("skip_version.txt")).unwrap(), "2.0.0");
    env.cmd().args(["skip"]).assert().success().stdout(predicate::str::contains("2.0.0"));

    env.cmd().args(["skip", "clear"]).assert().success().stdout(predicate::str::contains("cleared"));
    assert!(!env.dir().join("skip_version.txt").exists());
}

#[test]
fn test_skip_set_rejects_non_version() {
    let env = CliEnv::new();
    env.cmd()
        .args(["skip", "set", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version 'abc'"));
    assert!(!env.dir().join("skip_version.txt").exists());
}

#[test]
fn test_status_json() {
    let env = CliEnv::new();
    env.write_config("current_version = \"1.4.0\"\n");
    std::fs::write(env.dir().join("skip_version.txt"), "1.5.0").unwrap();

    let output = env.cmd().args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["currentVersion"], "1.4.0");
    assert_eq!(status["skipMarker"], "1.5.0");
    assert_eq!(status["lastCheck"], serde_json::Value::Null);
}

#[test]
fn test_check_without_manifest_url_fails() {
    let env = CliEnv::new();
    env.cmd()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest_url"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_json_against_server() {
    let mut server = mockito::Server::new_async().await;
    let _manifest = server
        .mock("GET", "/version.json")
        .match_query(Matcher::Any)
        .with_body(
            json!({
                "version": "2.0.0",
                "downloadUrl": format!("{}/setup.exe", server.url()),
                "changelog": ["Faster downloads"]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let env = CliEnv::new();
    env.write_config(&format!(
        "current_version = \"1.9.5\"\n\n[updater]\nmanifest_url = \"{}/version.json\"\n",
        server.url()
    ));

    let mut cmd = env.cmd();
    let output = tokio::task::spawn_blocking(move || cmd.args(["check", "--json"]).output().unwrap())
        .await
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["outcome"], "update-available");
    assert_eq!(result["currentVersion"], "1.9.5");
    assert_eq!(result["latestVersion"], "2.0.0");
    assert_eq!(result["changelog"][0], "Faster downloads");
    assert!(env.dir().join("version_cache.json").exists());
}

#[test]
fn test_cache_size_of_empty_cache() {
    let env = CliEnv::new();
    env.cmd().args(["cache", "size"]).assert().success().stdout(predicate::str::contains("0 B"));
}

#[test]
fn test_launch_missing_file() {
    let env = CliEnv::new();
    env.cmd()
        .args(["launch", env.dir().join("nope.exe").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_broken_config_is_reported() {
    let env = CliEnv::new();
    env.write_config("updater = [not toml");
    env.cmd().arg("status").assert().failure().stderr(predicate::str::contains("Configuration error"));

    // config init --force still works on a broken file
    env.cmd().args(["config", "init", "--force"]).assert().success();
}
