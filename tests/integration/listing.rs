//! Source lists and cached directory listings.

use jnu_exam::app::App;
use jnu_exam::config::AppConfig;
use jnu_exam::core::DownloaderError;
use jnu_exam::listing::{Node, SourceConfig, fetch_source_list};
use jnu_exam::progress::NullSink;
use jnu_exam::test_utils::{Route, TestServer, init_test_logging};
use std::sync::Arc;
use std::time::Duration;

use crate::common::listing_json;

fn app_with(config: AppConfig) -> App {
    App::new(config, Arc::new(NullSink)).unwrap()
}

/// The second request for the same URL is served from the cache.
#[tokio::test]
async fn test_directory_listing_is_fetched_once() {
    init_test_logging(None);

    let server = TestServer::start(vec![("/tree.json", Route::ok(listing_json("http://files")))])
        .await;
    let app = app_with(AppConfig::default());
    let url = server.url("/tree.json");

    let first = app.fetch_directory(&url).await.unwrap();
    let second = app.fetch_directory(&url).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(server.hits("/tree.json"), 1);
    assert_eq!(app.cache().len(), 1);

    let Some(Node::File(file)) = first.find("Math/final-2023.pdf") else {
        panic!("expected a file node");
    };
    assert_eq!(file.size, Some(11));
    assert_eq!(file.url_for("cf_url"), Some("http://files/files/final-2023.pdf"));
    assert_eq!(file.url_for("github_url"), None);
    assert_eq!(first.find("README.txt").and_then(Node::size), Some(5));
}

/// Failed fetches leave nothing behind, so a later call retries.
#[tokio::test]
async fn test_failed_listing_is_not_cached() {
    let server = TestServer::start(vec![("/broken.json", Route::ok("not json"))]).await;
    let app = app_with(AppConfig::default());
    let url = server.url("/broken.json");

    let err = app.fetch_directory(&url).await.unwrap_err();
    assert!(matches!(err, DownloaderError::Decode { .. }), "got {err:?}");

    let err = app.fetch_directory(&server.url("/missing.json")).await.unwrap_err();
    assert!(matches!(err, DownloaderError::Network { .. }), "got {err:?}");

    assert!(app.cache().is_empty());
    let _ = app.fetch_directory(&url).await;
    assert_eq!(server.hits("/broken.json"), 2);
}

#[tokio::test]
async fn test_fetch_source_list_uses_dir_url_fallback() {
    let body = r#"{
        "modern": {"json_url": "https://a.example.com/tree.json", "file_key": "cf_url"},
        "legacy": {"dir_url": "https://b.example.com/tree.json", "file_key": "gh_url"}
    }"#;
    let server = TestServer::start(vec![("/sources.json", Route::ok(body))]).await;
    let client = reqwest::Client::new();

    let sources = fetch_source_list(&client, &server.url("/sources.json"), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(sources.len(), 2);
    assert_eq!(sources["modern"].json_url, "https://a.example.com/tree.json");
    assert_eq!(sources["legacy"].json_url, "https://b.example.com/tree.json");
    assert_eq!(sources["legacy"].file_key, "gh_url");
}

/// Remote entries extend the built-ins; the config file's own entries win.
#[tokio::test]
async fn test_sources_merge_remote_list_under_config() {
    let body = r#"{
        "extra": {"json_url": "https://extra.example.com/tree.json", "file_key": "cf_url"},
        "pinned": {"json_url": "https://remote.example.com/tree.json", "file_key": "cf_url"}
    }"#;
    let server = TestServer::start(vec![("/sources.json", Route::ok(body))]).await;

    let mut config = AppConfig {
        sources_url: Some(server.url("/sources.json")),
        ..AppConfig::default()
    };
    config.sources.insert(
        "pinned".to_string(),
        SourceConfig::new("https://local.example.com/tree.json", "cf_url"),
    );
    let app = app_with(config);

    let sources = app.sources().await;
    assert!(sources.contains_key("cloudflare"));
    assert_eq!(sources["extra"].json_url, "https://extra.example.com/tree.json");
    assert_eq!(sources["pinned"].json_url, "https://local.example.com/tree.json");

    let err = app.source("nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Source 'nope' not found");
}

#[tokio::test]
async fn test_sources_survive_unreachable_remote_list() {
    let server = TestServer::start(vec![("/sources.json", Route::status(500))]).await;
    let app = app_with(AppConfig {
        sources_url: Some(server.url("/sources.json")),
        ..AppConfig::default()
    });

    let sources = app.sources().await;
    assert_eq!(sources.len(), jnu_exam::config::builtin_sources().len());
}
