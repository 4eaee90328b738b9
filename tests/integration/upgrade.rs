//! Version checks and the self-update sequence over HTTP.

use jnu_exam::config::AppConfig;
use jnu_exam::core::DownloaderError;
use jnu_exam::progress::ProgressEvent;
use jnu_exam::test_utils::{Route, TestServer, init_test_logging};
use jnu_exam::upgrade::{PlatformKey, SelfUpdater, UpdateChecker, UpdatePaths};
use std::path::Path;
use tempfile::TempDir;

use crate::common::{channel_sink, drain, sha256_hex};

const PRODUCT: &str = "JNU-EXAM-Downloader";

fn metadata_json(base_url: &str, checksum: &str) -> String {
    serde_json::json!({
        "notice": {
            "show": true,
            "id": "2024-exams",
            "title": "New papers",
            "content": "Spring papers are up."
        },
        "update": {
            "version": "2.2.0",
            "force": false,
            "desc": "Faster listings",
            "platforms": {
                "windows-amd64": {"url": format!("{base_url}/bin/windows-amd64.exe"), "checksum": checksum},
                "linux-amd64": {"url": format!("{base_url}/bin/linux-amd64"), "checksum": checksum}
            }
        }
    })
    .to_string()
}

fn install_fake_exe(dir: &Path) -> UpdatePaths {
    let exe = dir.join("jnu-exam-current");
    std::fs::write(&exe, b"old binary").unwrap();
    UpdatePaths::for_executable(exe, PRODUCT)
}

fn checker(server: &TestServer, local_version: &str, platform: &str) -> UpdateChecker {
    let config = AppConfig {
        metadata_url: server.url("/metadata.json"),
        current_version: local_version.to_string(),
        ..AppConfig::default()
    };
    UpdateChecker::from_config(&config, reqwest::Client::new()).with_platform(PlatformKey::from(platform))
}

#[tokio::test]
async fn test_check_reports_update_and_notice() {
    init_test_logging(None);
    let server =
        TestServer::start(vec![("/metadata.json", Route::ok(metadata_json("http://dl", "abc")))])
            .await;

    let result = checker(&server, "2.1.0", "windows-amd64").check().await.unwrap();

    assert!(result.has_update);
    assert!(!result.is_force);
    assert_eq!(result.current_ver, "2.1.0");
    assert_eq!(result.remote_ver, "2.2.0");
    assert_eq!(result.update_desc, "Faster listings");
    assert_eq!(result.download_url, "http://dl/bin/windows-amd64.exe");
    assert_eq!(result.checksum, "abc");
    assert!(result.notice.show);
    assert_eq!(result.notice.id, "2024-exams");
}

#[tokio::test]
async fn test_check_without_platform_target() {
    let server =
        TestServer::start(vec![("/metadata.json", Route::ok(metadata_json("http://dl", "abc")))])
            .await;

    let result = checker(&server, "2.1.0", "darwin-arm64").check().await.unwrap();

    assert!(!result.has_update);
    assert_eq!(result.remote_ver, "2.2.0");
    assert!(result.download_url.is_empty());
}

#[tokio::test]
async fn test_check_failures_are_typed() {
    let server = TestServer::start(vec![("/metadata.json", Route::ok("<html>"))]).await;
    let err = checker(&server, "2.1.0", "linux-amd64").check().await.unwrap_err();
    assert!(matches!(err, DownloaderError::Decode { .. }), "got {err:?}");

    let server = TestServer::start(vec![("/metadata.json", Route::status(500))]).await;
    let err = checker(&server, "2.1.0", "linux-amd64").check().await.unwrap_err();
    assert!(matches!(err, DownloaderError::Network { .. }), "got {err:?}");
}

/// Check, then download, verify and swap the advertised binary.
#[tokio::test]
async fn test_check_then_apply_update() {
    let binary = b"#!/bin/sh\necho new\n".repeat(1024);
    let checksum = sha256_hex(&binary);

    let server = TestServer::start(vec![("/bin/linux-amd64", Route::ok(binary.clone()))]).await;
    server.route("/metadata.json", Route::ok(metadata_json(&server.url(""), &checksum)));

    let result = checker(&server, "2.1.0", "linux-amd64").check().await.unwrap();
    assert!(result.has_update);

    let temp = TempDir::new().unwrap();
    let paths = install_fake_exe(temp.path());
    let (sink, mut rx) = channel_sink();
    let updater = SelfUpdater::new(reqwest::Client::new(), paths.clone(), sink);

    let installed = updater.apply_update(&result.download_url, &result.checksum).await.unwrap();

    assert_eq!(installed, paths.target);
    assert_eq!(std::fs::read(&paths.target).unwrap(), binary);
    assert_eq!(std::fs::read(&paths.backup).unwrap(), b"old binary");
    assert!(!paths.temp.exists());
    assert!(!paths.current_exe.exists() || paths.current_exe == paths.target);
    assert_eq!(server.hits("/bin/linux-amd64"), 1);

    let events = drain(&mut rx);
    assert!(events.iter().all(|e| e.name() == ProgressEvent::UPDATE_PROGRESS));
    assert_eq!(events.last().map(ProgressEvent::percentage), Some(100.0));
}

#[tokio::test]
async fn test_apply_update_rejects_tampered_binary() {
    let server = TestServer::start(vec![("/bin/app", Route::ok("tampered bytes"))]).await;
    let temp = TempDir::new().unwrap();
    let paths = install_fake_exe(temp.path());
    let (sink, _rx) = channel_sink();
    let updater = SelfUpdater::new(reqwest::Client::new(), paths.clone(), sink);

    let err = updater
        .apply_update(&server.url("/bin/app"), &sha256_hex(b"genuine bytes"))
        .await
        .unwrap_err();

    assert!(matches!(err, DownloaderError::ChecksumMismatch { .. }), "got {err:?}");
    assert_eq!(std::fs::read(&paths.current_exe).unwrap(), b"old binary");
    assert!(!paths.target.exists());
    assert!(!paths.backup.exists());
    assert!(!paths.temp.exists());
}

#[tokio::test]
async fn test_apply_update_download_failure_keeps_executable() {
    let server = TestServer::start(vec![]).await;
    let temp = TempDir::new().unwrap();
    let paths = install_fake_exe(temp.path());
    let (sink, _rx) = channel_sink();
    let updater = SelfUpdater::new(reqwest::Client::new(), paths.clone(), sink);

    let err = updater.apply_update(&server.url("/bin/app"), "").await.unwrap_err();

    assert!(matches!(err, DownloaderError::Network { .. }), "got {err:?}");
    assert_eq!(std::fs::read(&paths.current_exe).unwrap(), b"old binary");
    assert!(!paths.backup.exists());
}
