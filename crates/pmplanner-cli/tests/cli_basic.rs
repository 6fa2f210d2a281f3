//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

const FIXTURE: &str = r#"{
    "definitions": [
        {
            "id": "def-filters",
            "site_id": "hq",
            "description": "Replace AHU filters",
            "frequency": "weekly",
            "duration": {"kind": "fixed_hours", "hours": 2},
            "workers": ["w1"]
        }
    ],
    "hours": [
        {
            "site_id": "hq",
            "days": [
                {"weekday": "Mon", "opening": "08:00:00", "closing": "17:00:00"},
                {"weekday": "Tue", "opening": "08:00:00", "closing": "17:00:00"},
                {"weekday": "Wed", "opening": "08:00:00", "closing": "17:00:00"},
                {"weekday": "Thu", "opening": "08:00:00", "closing": "17:00:00"},
                {"weekday": "Fri", "opening": "08:00:00", "closing": "17:00:00"}
            ]
        }
    ],
    "machines": [
        {"id": "m1", "company_id": "acme", "name": "Lift 12m", "machine_type": "lift"}
    ],
    "usage": [
        {"id": "u1", "machine_id": "m1", "start": "2025-03-04T08:00:00", "end": "2025-03-06T17:00:00"}
    ]
}"#;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_pmplanner"))
        .env("PMPLANNER_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout is JSON")
}

fn imported() -> TempDir {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.json");
    std::fs::write(&fixture, FIXTURE).unwrap();

    let (code, stdout, stderr) = run_cli(dir.path(), &["import", fixture.to_str().unwrap()]);
    assert_eq!(code, 0, "import failed: {stderr}");
    let summary = json(&stdout);
    assert_eq!(summary["definitions"], 1);
    assert_eq!(summary["machines"], 1);
    assert_eq!(summary["usage"], 1);
    dir
}

const PERIOD: [&str; 6] = ["--site", "hq", "--year", "2025", "--month", "3"];

#[test]
fn test_generate_and_list_drafts() {
    let dir = imported();

    let mut args = vec!["draft", "generate"];
    args.extend(PERIOD);
    let (code, stdout, stderr) = run_cli(dir.path(), &args);
    assert_eq!(code, 0, "generate failed: {stderr}");
    // Mondays of March 2025: 3, 10, 17, 24, 31
    assert_eq!(json(&stdout)["placed"], 5);

    let mut args = vec!["draft", "list"];
    args.extend(PERIOD);
    let (code, stdout, _) = run_cli(dir.path(), &args);
    assert_eq!(code, 0);
    let drafts = json(&stdout);
    let drafts = drafts.as_array().unwrap();
    assert_eq!(drafts.len(), 5);
    assert!(drafts.iter().all(|d| d["state"] == "DRAFT"));
}

#[test]
fn test_block_create_then_publish() {
    let dir = imported();

    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &[
            "block",
            "create",
            "--site",
            "hq",
            "--description",
            "Inspect roof drains",
            "--start",
            "2025-03-04T08:00",
            "--hours",
            "2",
            "--worker",
            "w2",
        ],
    );
    assert_eq!(code, 0, "block create failed: {stderr}");
    let block = json(&stdout);
    assert_eq!(block["state"], "DRAFT");
    assert_eq!(block["duration_hours"], 2);

    let mut args = vec!["publish"];
    args.extend(PERIOD);
    let (code, stdout, stderr) = run_cli(dir.path(), &args);
    assert_eq!(code, 0, "publish failed: {stderr}");
    assert_eq!(json(&stdout)["published"], 1);

    let mut args = vec!["draft", "list"];
    args.extend(PERIOD);
    let (_, stdout, _) = run_cli(dir.path(), &args);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 0);
}

#[test]
fn test_block_outside_opening_hours_fails() {
    let dir = imported();

    let (code, _, stderr) = run_cli(
        dir.path(),
        &[
            "block",
            "create",
            "--site",
            "hq",
            "--description",
            "Night shift",
            "--start",
            "2025-03-04T20:00",
            "--hours",
            "2",
            "--worker",
            "w2",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_agenda() {
    let dir = imported();

    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &["agenda", "--company", "acme", "--year", "2025", "--month", "3"],
    );
    assert_eq!(code, 0, "agenda failed: {stderr}");
    let agenda = json(&stdout);
    let agenda = agenda.as_array().unwrap();
    assert_eq!(agenda.len(), 1);
    assert_eq!(agenda[0]["machine"]["id"], "m1");

    let (code, stdout, _) = run_cli(
        dir.path(),
        &[
            "agenda", "--company", "acme", "--year", "2025", "--month", "3", "--type", "crane",
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 0);
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "scheduling.weekly_hour_cap"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "42");

    let (code, _, _) = run_cli(
        dir.path(),
        &["config", "set", "scheduling.weekly_hour_cap", "30"],
    );
    assert_eq!(code, 0);

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "scheduling.weekly_hour_cap"]);
    assert_eq!(stdout.trim(), "30");
}

#[test]
fn test_config_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_malformed_config_fails_commands() {
    let dir = imported();
    std::fs::write(
        dir.path().join("config.toml"),
        "[scheduling\nweekly_hour_cap = \"lots\"\n",
    )
    .unwrap();

    let mut args = vec!["draft", "list"];
    args.extend(PERIOD);
    let (code, stdout, stderr) = run_cli(dir.path(), &args);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("error:"));
}
