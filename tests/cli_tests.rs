use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn billing_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("aba-billing"))
}

fn init(config_path: &Path) {
    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
}

fn login(config_path: &Path, user_id: &str, role: &str) {
    billing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "login",
            "--token",
            "tok-123",
            "--user-id",
            user_id,
            "--role",
            role,
            "--name",
            "Ana",
        ])
        .assert()
        .success();
}

/// Point the config at a port nothing listens on
fn write_unreachable_api(config_path: &Path) {
    fs::write(
        config_path.join("config.toml"),
        r#"[api]
base_url = "http://127.0.0.1:9"
timeout_secs = 2
"#,
    )
    .unwrap();
}

#[test]
fn test_help() {
    billing_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Invoice reconciliation CLI for the ABA clinic",
        ));
}

#[test]
fn test_version() {
    billing_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aba-billing"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized billing config"));

    let config = fs::read_to_string(config_path.join("config.toml")).unwrap();
    assert!(config.contains("[api]"));
    assert!(config.contains("visibility = \"fail-open\""));
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");

    init(&config_path);

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status_before_login() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:3000"))
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_login_then_status_shows_user() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);

    billing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "login",
            "--token",
            "tok-123",
            "--user-id",
            "7",
            "--role",
            "pai",
            "--name",
            "Ana",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as user #7 (PAI)"));

    assert!(config_path.join("session.toml").exists());

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#7 Ana (PAI)"));
}

#[test]
fn test_login_rejects_unknown_role() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);

    billing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "login",
            "--token",
            "tok",
            "--user-id",
            "1",
            "--role",
            "boss",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown role"));
}

#[test]
fn test_logout() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);
    login(&config_path, "7", "PAI");

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));

    assert!(!config_path.join("session.toml").exists());

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active session."));
}

#[test]
fn test_list_requires_login() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not authenticated"));
}

#[test]
fn test_create_requires_consultation() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);
    login(&config_path, "1", "ADMIN");

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "create", "--total", "45"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Select a consultation"));
}

#[test]
fn test_create_rejects_zero_amount() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);
    login(&config_path, "1", "ADMIN");

    billing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "create",
            "--consultation",
            "12",
            "--total",
            "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Amount must be greater than zero"));
}

#[test]
fn test_create_is_admin_only() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);
    login(&config_path, "7", "PAI");

    billing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "create",
            "--consultation",
            "12",
            "--total",
            "45",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Role PAI is not allowed to create invoices",
        ));
}

#[test]
fn test_invalid_filter_date() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);
    login(&config_path, "1", "ADMIN");

    billing_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "list",
            "--from",
            "15/03/2026",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date '15/03/2026'"));
}

#[test]
fn test_list_reports_unreachable_backend() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billing-config");
    init(&config_path);
    write_unreachable_api(&config_path);
    login(&config_path, "1", "ADMIN");

    billing_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request failed"));
}
