//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::MockSimServer;

/// Get a command for the vdos-dashboard binary
fn dashboard_cmd() -> Command {
    Command::cargo_bin("vdos-dashboard").unwrap()
}

const STATE: &str = r#"{"current_tick": 7, "is_running": false, "auto_tick": false, "sim_time": "Day 0 07:00"}"#;

fn route_views(server: &MockSimServer) {
    server
        .route("GET", "/api/v1/simulation", 200, STATE)
        .route("GET", "/api/v1/people", 200, r#"[{"id": 1, "name": "Ada", "role": "Lead"}]"#)
        .route("GET", "/api/v1/people/1/plans", 200, "[]")
        .route("GET", "/api/v1/people/1/daily-reports", 200, "[]")
        .route("GET", "/api/v1/metrics/planner", 200, "[]")
        .route("GET", "/api/v1/simulation/token-usage", 200, "{}")
        .route("GET", "/api/v1/events", 200, "[]");
}

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    dashboard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VDOS Dashboard"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("advance"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    dashboard_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vdos-dashboard"))
        .stdout(predicate::str::contains("Build Information"))
        .stdout(predicate::str::contains("Git Hash"));
}

#[test]
fn test_short_version_flag() {
    dashboard_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vdos-dashboard"));
}

#[test]
fn test_advance_help() {
    dashboard_cmd()
        .args(["advance", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--ticks"))
        .stdout(predicate::str::contains("--reason"));
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_default() {
    dashboard_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[server]"))
        .stdout(predicate::str::contains("[polling]"))
        .stdout(predicate::str::contains("[simulation]"))
        .stdout(predicate::str::contains("[logging]"));
}

#[test]
fn test_config_validate_nonexistent_file() {
    dashboard_cmd()
        .args(["config", "validate", "--config", "/nonexistent/path/config.toml"])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_init_writes_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dashboard.toml");

    dashboard_cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written"));
    assert!(path.exists());

    dashboard_cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

// ─────────────────────────────────────────────────────────────────
// Simulation Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_status_unreachable_server() {
    dashboard_cmd()
        .args(["status", "--base-url", "http://127.0.0.1:9", "-q"])
        .assert()
        .failure()
        .code(30);
}

#[test]
fn test_invalid_base_url_override() {
    dashboard_cmd()
        .args(["status", "--base-url", "ftp://example.com"])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("http://"));
}

#[test]
fn test_full_reset_requires_yes() {
    dashboard_cmd()
        .args(["full-reset", "--base-url", "http://127.0.0.1:9", "-q"])
        .assert()
        .failure()
        .code(50)
        .stderr(predicate::str::contains("confirm"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_prints_views() {
    let server = MockSimServer::start().await;
    route_views(&server);

    let base_url = server.base_url();
    let assert = tokio::task::spawn_blocking(move || {
        dashboard_cmd()
            .args(["status", "-q", "--base-url", &base_url])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("status: stopped  tick: 7  time: Day 0 07:00"))
        .stdout(predicate::str::contains("[x] #1 Ada (Lead)"))
        .stdout(predicate::str::contains("refresh: idle every 60s"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_advance_sends_defaults() {
    let server = MockSimServer::start().await;
    route_views(&server);
    server.route("POST", "/api/v1/simulation/advance", 204, "");

    let base_url = server.base_url();
    let assert = tokio::task::spawn_blocking(move || {
        dashboard_cmd()
            .args(["advance", "-q", "--base-url", &base_url])
            .assert()
    })
    .await
    .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("Advanced 1 tick(s)"));

    let request = &server.requests_to("/api/v1/simulation/advance")[0];
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["ticks"], 1);
    assert_eq!(body["reason"], "manual");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_failure_shows_server_message() {
    let server = MockSimServer::start().await;
    route_views(&server);
    server.route("POST", "/api/v1/simulation/start", 409, "Simulation already running");

    let base_url = server.base_url();
    let assert = tokio::task::spawn_blocking(move || {
        dashboard_cmd()
            .args(["start", "-q", "--seed", "5", "--base-url", &base_url])
            .assert()
    })
    .await
    .unwrap();
    assert
        .failure()
        .code(40)
        .stderr(predicate::str::contains("Simulation already running"));

    let request = &server.requests_to("/api/v1/simulation/start")[0];
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["random_seed"], 5);
    assert_eq!(body["include_person_ids"], serde_json::json!([1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_persona_create_from_file() {
    let server = MockSimServer::start().await;
    route_views(&server);
    server.route(
        "POST",
        "/api/v1/people",
        200,
        r#"{"id": 9, "name": "Hana Kim", "role": "Site Reliability Engineer"}"#,
    );

    let base_url = server.base_url();
    let file = common::persona_fixture();
    let assert = tokio::task::spawn_blocking(move || {
        dashboard_cmd()
            .args(["persona", "create", "-q", "--base-url", &base_url, "--file"])
            .arg(&file)
            .assert()
    })
    .await
    .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("Persona #9 created"));

    let request = &server.requests_to("/api/v1/people")
        .into_iter()
        .find(|r| r.method == "POST")
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["name"], "Hana Kim");
    assert_eq!(body["skills"], serde_json::json!(["Kubernetes", "Terraform", "Incident response"]));
    assert_eq!(body["event_playbook"]["outage"][0], "Page the on-call lead");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_persona_generate_saves_draft() {
    let server = MockSimServer::start().await;
    server.route(
        "POST",
        "/api/v1/personas/generate",
        200,
        r#"{"persona": {"name": "Lee Park", "role": "Data Scientist", "skills": ["Python", "SQL"], "personality": ["Curious"]}}"#,
    );
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("draft.toml");

    let base_url = server.base_url();
    let output_arg = output.clone();
    let assert = tokio::task::spawn_blocking(move || {
        dashboard_cmd()
            .args(["persona", "generate", "-q", "--base-url", &base_url])
            .args(["--prompt", "Curious data scientist", "--output"])
            .arg(&output_arg)
            .assert()
    })
    .await
    .unwrap();
    assert
        .success()
        .stdout(predicate::str::contains("name: Lee Park"))
        .stdout(predicate::str::contains("skills: Python, SQL"));

    let saved = std::fs::read_to_string(&output).unwrap();
    assert!(saved.contains("Lee Park"));
}
