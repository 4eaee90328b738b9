//! The `jnu-exam` binary, end to end.

use assert_cmd::Command;
use jnu_exam::test_utils::{Route, TestServer};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use crate::common::listing_json;

/// A command isolated from the user's config, colours and progress bars.
fn jnu_exam(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jnu-exam").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("JNU_EXAM_NO_PROGRESS", "1")
        .arg("--config")
        .arg(config_dir.join("config.toml"));
    cmd
}

fn write_config(dir: &Path, body: &str) {
    std::fs::write(dir.join("config.toml"), body).unwrap();
}

/// Start a server carrying a listing and its files, plus a config naming it `local`.
async fn listing_fixture(temp: &TempDir) -> TestServer {
    let server = TestServer::start(vec![
        ("/files/final-2023.pdf", Route::ok("exam answer")),
        ("/files/README.txt", Route::ok("hello")),
    ])
    .await;
    server.route("/tree.json", Route::ok(listing_json(&server.url(""))));

    write_config(
        temp.path(),
        &format!(
            "[sources.local]\njson_url = \"{}\"\nfile_key = \"cf_url\"\n",
            server.url("/tree.json")
        ),
    );
    server
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    jnu_exam(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sources"))
        .stdout(predicate::str::contains("check-update"))
        .stdout(predicate::str::contains("checksum"));
}

#[test]
fn test_checksum_prints_hex_digest() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("hello.txt");
    std::fs::write(&file, "hello world").unwrap();

    jnu_exam(temp.path())
        .arg("checksum")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9  ",
        ));
}

#[test]
fn test_checksum_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    jnu_exam(temp.path())
        .arg("checksum")
        .arg(temp.path().join("nope.bin"))
        .assert()
        .failure();
}

#[test]
fn test_sources_json_includes_configured_source() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "[sources.mine]\njson_url = \"https://mine.example.com/tree.json\"\nfile_key = \"cf_url\"\n",
    );

    jnu_exam(temp.path())
        .args(["sources", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mine\""))
        .stdout(predicate::str::contains("https://mine.example.com/tree.json"))
        .stdout(predicate::str::contains("\"cloudflare\""));
}

#[test]
fn test_unknown_source_fails() {
    let temp = TempDir::new().unwrap();
    jnu_exam(temp.path())
        .args(["ls", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source 'nowhere' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ls_and_search_against_local_listing() {
    let temp = TempDir::new().unwrap();
    let _server = listing_fixture(&temp).await;
    let config_dir = temp.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        jnu_exam(&config_dir).args(["ls", "local"]).output().unwrap()
    })
    .await
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Math/"));
    assert!(stdout.contains("README.txt"));

    let config_dir = temp.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        jnu_exam(&config_dir).args(["ls", "local", "--search", "FINAL"]).output().unwrap()
    })
    .await
    .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Math/final-2023.pdf"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_from_local_listing() {
    let temp = TempDir::new().unwrap();
    let _server = listing_fixture(&temp).await;
    let out_dir = temp.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();

    let config_dir = temp.path().to_path_buf();
    let target = out_dir.clone();
    let output = tokio::task::spawn_blocking(move || {
        jnu_exam(&config_dir)
            .args(["download", "local", "Math/final-2023.pdf", "-o"])
            .arg(&target)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        std::fs::read_to_string(out_dir.join("final-2023.pdf")).unwrap(),
        "exam answer"
    );
}
