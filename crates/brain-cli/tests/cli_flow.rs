//! End-to-end tests driving the `brain` binary against a temporary database.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn brain_binary() -> String {
    env!("CARGO_BIN_EXE_brain").to_string()
}

/// Runs `brain` with an isolated home and the database inside `temp`.
fn brain(temp: &Path, args: &[&str]) -> Output {
    Command::new(brain_binary())
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join("config"))
        .env("XDG_DATA_HOME", temp.join("data"))
        .env("BRAIN_DATABASE_PATH", temp.join("db/brain.db"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run brain")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "brain should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn export(temp: &Path) -> serde_json::Value {
    let output = brain(temp, &["export"]);
    serde_json::from_str(&stdout_of(&output)).expect("export should be JSON")
}

#[test]
fn test_set_then_status_and_export() {
    let temp = TempDir::new().unwrap();

    let output = brain(
        temp.path(),
        &["set", "--location", "Home", "--movement", "Stationary", "-a", "Deep Focus"],
    );
    let stdout = stdout_of(&output);
    assert!(stdout.starts_with("Active: Home | Stationary | Deep Focus\n"));
    assert!(stdout.contains("Tracking since"));
    assert!(temp.path().join("db/brain.db").exists());
    assert!(temp.path().join("db/.lock").exists());

    let stdout = stdout_of(&brain(temp.path(), &["status"]));
    assert!(stdout.contains("Active:      Home | Stationary | Deep Focus\n"));

    let state = export(temp.path());
    assert_eq!(state["currentSession"]["active"]["activity"][0], "Deep Focus");
    assert_eq!(state["sessions"].as_array().unwrap().len(), 0);
}

#[test]
fn test_clear_closes_session() {
    let temp = TempDir::new().unwrap();
    stdout_of(&brain(temp.path(), &["set", "-a", "Work"]));

    let stdout = stdout_of(&brain(temp.path(), &["clear"]));
    assert!(stdout.contains("No activity selected"));

    let state = export(temp.path());
    assert!(state["currentSession"].is_null());
    let sessions = state["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["active"]["activity"][0], "Work");
}

#[test]
fn test_define_then_options_lists_it() {
    let temp = TempDir::new().unwrap();

    let stdout = stdout_of(&brain(temp.path(), &["define", "Piano", "--productive", "3"]));
    assert_eq!(stdout, "Defined 'Piano' as productive (+3.0/m).\n");

    let stdout = stdout_of(&brain(temp.path(), &["options"]));
    assert!(stdout.contains("  Piano                   +3.0/m\n"));

    let state = export(temp.path());
    assert_eq!(state["activityMeta"]["Piano"]["type"], "productive");
}

#[test]
fn test_define_rejects_negative_rate() {
    let temp = TempDir::new().unwrap();
    let output = brain(temp.path(), &["define", "Piano", "--relax=-1"]);
    assert!(!output.status.success());
}

#[test]
fn test_reset_requires_yes() {
    let temp = TempDir::new().unwrap();
    stdout_of(&brain(temp.path(), &["set", "-a", "Work"]));

    let output = brain(temp.path(), &["reset"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--yes"));
    assert_eq!(export(temp.path())["active"]["activity"][0], "Work");

    let stdout = stdout_of(&brain(temp.path(), &["reset", "--yes"]));
    assert_eq!(stdout, "All tracking data removed.\n");

    let stdout = stdout_of(&brain(temp.path(), &["report"]));
    assert!(stdout.starts_with("No saved data yet."));
}

#[test]
fn test_report_json_after_session() {
    let temp = TempDir::new().unwrap();
    stdout_of(&brain(temp.path(), &["set", "-l", "Gym", "-a", "Workout"]));
    stdout_of(&brain(temp.path(), &["set", "-l", "Gym"]));

    let stdout = stdout_of(&brain(temp.path(), &["report", "--json"]));
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["overview"]["session_count"], 1);
    assert_eq!(report["by_location"][0]["label"], "Gym");
}

#[test]
fn test_config_file_sets_state_key() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("custom.toml");
    std::fs::write(&config_path, "state_key = \"custom_key\"\n").unwrap();
    let config_arg = config_path.to_str().unwrap();

    stdout_of(&brain(temp.path(), &["-c", config_arg, "set", "-a", "Work"]));

    let stdout = stdout_of(&brain(temp.path(), &["-c", config_arg, "export"]));
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(state["active"]["activity"][0], "Work");

    // Default key is untouched.
    let state = export(temp.path());
    assert_eq!(state["active"]["activity"].as_array().unwrap().len(), 0);
}
