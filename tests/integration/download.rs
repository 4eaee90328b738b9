//! File downloads over HTTP.

use jnu_exam::app::App;
use jnu_exam::config::AppConfig;
use jnu_exam::core::DownloaderError;
use jnu_exam::download::{DownloadOptions, download_file};
use jnu_exam::progress::{DownloadProgress, ProgressEvent};
use jnu_exam::test_utils::{Route, TestServer};
use tempfile::TempDir;

use crate::common::{channel_sink, drain, sha256_hex};

#[tokio::test]
async fn test_download_reports_progress_and_hash() {
    let body = vec![7u8; 200 * 1024];
    let server = TestServer::start(vec![("/paper.pdf", Route::ok(body.clone()))]).await;
    let temp = TempDir::new().unwrap();
    let save_path = temp.path().join("nested/dir/paper.pdf");
    let (sink, mut rx) = channel_sink();

    let downloaded = download_file(
        &reqwest::Client::new(),
        &server.url("/paper.pdf"),
        &save_path,
        sink,
        DownloadOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(downloaded.bytes, body.len() as u64);
    assert_eq!(downloaded.sha256, sha256_hex(&body));
    assert_eq!(std::fs::read(&save_path).unwrap(), body);

    let events = drain(&mut rx);
    assert!(!events.is_empty());
    for event in &events {
        assert_eq!(event.name(), ProgressEvent::DOWNLOAD_PROGRESS);
        let ProgressEvent::Download(DownloadProgress { filename, .. }) = event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(filename, "paper.pdf");
    }
    let percentages: Vec<f64> = events.iter().map(ProgressEvent::percentage).collect();
    assert!(percentages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percentages.last().copied(), Some(100.0));
}

/// Without a length the file still arrives, silently.
#[tokio::test]
async fn test_download_without_length_emits_nothing() {
    let server =
        TestServer::start(vec![("/notes.txt", Route::ok_without_length("hello world"))]).await;
    let temp = TempDir::new().unwrap();
    let save_path = temp.path().join("notes.txt");
    let (sink, mut rx) = channel_sink();

    let downloaded = download_file(
        &reqwest::Client::new(),
        &server.url("/notes.txt"),
        &save_path,
        sink,
        DownloadOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(downloaded.bytes, 11);
    assert_eq!(std::fs::read_to_string(&save_path).unwrap(), "hello world");
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_download_http_error_writes_nothing() {
    let server = TestServer::start(vec![]).await;
    let temp = TempDir::new().unwrap();
    let save_path = temp.path().join("missing.pdf");
    let (sink, _rx) = channel_sink();

    let app = App::new(AppConfig::default(), sink).unwrap();
    let err = app.download_file(&server.url("/missing.pdf"), &save_path).await.unwrap_err();

    assert!(matches!(err, DownloaderError::Network { .. }), "got {err:?}");
    assert!(!save_path.exists());
}
