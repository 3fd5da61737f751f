//! End-to-end tests of the `palaver` binary
//!
//! Every command runs in a temporary working directory so that no local
//! config file or dotenv file is picked up.

mod common;

use assert_cmd::Command;
use common::{create_temp_archive, mock_client, temp_config_file};
use predicates::prelude::*;
use std::path::Path;

fn palaver(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("palaver").expect("binary should build");
    cmd.current_dir(cwd)
        .env_remove("CEREBRAS_API_KEY")
        .env_remove("PALAVER_PROVIDER")
        .env_remove("PALAVER_ARCHIVE_DB")
        .env_remove("RUST_LOG");
    cmd
}

async fn archive_one_session(archive: &palaver::storage::SessionArchive) -> String {
    let mut client = mock_client();
    let id = client.start_new_session("alice", None).unwrap();
    client.send_message(&id, "What is Rust?").await.unwrap();
    archive.save(&client.export_session(&id).unwrap()).unwrap();
    id
}

#[test]
fn test_models_json_without_credentials() {
    let (dir, config_path) = temp_config_file("provider:\n  type: cerebras\n");
    let output = palaver(dir.path())
        .args(["--config", config_path.to_str().unwrap(), "models", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let models: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(models
        .iter()
        .any(|m| m["id"] == "llama-4-scout-17b-16e-instruct"));
}

#[test]
fn test_models_table_for_mock_provider() {
    let (dir, _) = temp_config_file("");
    palaver(dir.path())
        .args(["--provider", "mock", "models"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mock-gpt-4 *"))
        .stdout(predicate::str::contains("Mock Small Model"));
}

#[test]
fn test_config_file_selects_provider() {
    let (dir, config_path) = temp_config_file("provider:\n  type: mock\n");
    palaver(dir.path())
        .args(["--config", config_path.to_str().unwrap(), "models", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mock-gpt-3"));
}

#[test]
fn test_invalid_provider_rejected() {
    let (dir, _) = temp_config_file("");
    palaver(dir.path())
        .args(["--provider", "nope", "models"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid provider type: nope"));
}

#[test]
fn test_chat_without_key_fails_before_prompting() {
    let (dir, _) = temp_config_file("");
    palaver(dir.path())
        .args(["chat"])
        .write_stdin("hello\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing credentials"));
}

#[test]
fn test_sessions_empty_archive() {
    let (dir, _) = temp_config_file("");
    let db = dir.path().join("sessions.db");
    palaver(dir.path())
        .args(["sessions", "--archive", db.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No archived sessions"));
}

#[tokio::test]
async fn test_export_archived_session_by_prefix() {
    let (archive, dir) = create_temp_archive();
    let id = archive_one_session(&archive).await;
    let db = archive.path().to_str().unwrap().to_string();

    palaver(dir.path())
        .args(["--provider", "mock", "--archive", &db])
        .args(["export", &id[..8], "--format", "txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Session ID: {}", id)))
        .stdout(predicate::str::contains("User: What is Rust?"));
}

#[tokio::test]
async fn test_metrics_json_for_archived_session() {
    let (archive, dir) = create_temp_archive();
    let id = archive_one_session(&archive).await;
    let db = archive.path().to_str().unwrap().to_string();

    let output = palaver(dir.path())
        .args(["--provider", "mock", "--archive", &db, "metrics", &id, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let metrics: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(metrics["api_calls"], 1);
    assert!(metrics["token_count"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_export_unknown_format_fails() {
    let (archive, dir) = create_temp_archive();
    let id = archive_one_session(&archive).await;
    let db = archive.path().to_str().unwrap().to_string();

    palaver(dir.path())
        .args(["--provider", "mock", "--archive", &db])
        .args(["export", &id, "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported export format: xml"));
}

#[test]
fn test_export_unknown_session_fails() {
    let (_archive, dir) = create_temp_archive();
    let db = dir.path().join("sessions.db");

    palaver(dir.path())
        .args(["--provider", "mock", "--archive", db.to_str().unwrap()])
        .args(["export", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session deadbeef does not exist"));
}
