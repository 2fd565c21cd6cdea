//! Smoke tests for the friendwatch binary: exit codes and state side effects.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn friendwatch(state_dir: &Path, args: &[&str]) -> Output {
    // An empty PATH guarantees nxapi cannot be found.
    let empty_path = state_dir.join("empty-path");
    std::fs::create_dir_all(&empty_path).unwrap();

    Command::new(env!("CARGO_BIN_EXE_friendwatch"))
        .arg("--state-dir")
        .arg(state_dir)
        .args(args)
        .env("PATH", &empty_path)
        .env_remove("RUST_LOG")
        .env_remove("FRIENDWATCH_HOME")
        .output()
        .expect("run friendwatch")
}

fn write_config(dir: &Path, yaml: &str) {
    std::fs::write(dir.join("config.yaml"), yaml).unwrap();
}

#[test]
fn test_missing_config_exits_non_zero() {
    let temp = TempDir::new().unwrap();

    let output = friendwatch(temp.path(), &["run"]);

    assert!(!output.status.success());
    assert!(!temp.path().join("state.json").exists());
}

#[test]
fn test_invalid_config_exits_non_zero() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "ntfy:\n  enabled: true\n");

    let output = friendwatch(temp.path(), &[]);

    assert!(!output.status.success());
}

#[test]
fn test_source_failure_exits_non_zero_without_state() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "watched: []\n");

    let output = friendwatch(temp.path(), &["run"]);

    assert!(!output.status.success());
    assert!(!temp.path().join("state.json").exists());
}

#[test]
fn test_source_failure_keeps_existing_state() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "watched: []\n");
    let state = r#"{"version":1,"last_check":"2025-01-01T00:00:00Z","friends":[]}"#;
    std::fs::write(temp.path().join("state.json"), state).unwrap();

    let output = friendwatch(temp.path(), &["run"]);

    assert!(!output.status.success());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("state.json")).unwrap(),
        state
    );
}

#[test]
fn test_send_without_transport_fails_and_leaves_state_alone() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "watched: []\n");

    let output = friendwatch(temp.path(), &["test", "watched"]);

    assert!(!output.status.success());
    assert!(!temp.path().join("state.json").exists());
}

#[test]
fn test_status_without_state_succeeds() {
    let temp = TempDir::new().unwrap();

    let output = friendwatch(temp.path(), &["status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No saved state"));
    assert!(!temp.path().join("state.json").exists());
}

#[test]
fn test_status_lists_cached_friends() {
    let temp = TempDir::new().unwrap();
    let state = r#"{
        "version": 1,
        "last_check": "2025-01-01T00:00:00Z",
        "friends": [{
            "id": "abc", "display_name": "Alice", "is_online": true,
            "game_name": "Zelda", "platform": "switch2",
            "updated_at": "2024-12-31T23:00:00Z"
        }]
    }"#;
    std::fs::write(temp.path().join("state.json"), state).unwrap();

    let output = friendwatch(temp.path(), &["status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 cached friends"));
    assert!(stdout.contains("Alice"));
    assert!(stdout.contains("online, Zelda (NS2)"));
}
