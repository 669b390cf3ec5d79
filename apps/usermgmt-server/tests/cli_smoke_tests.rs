//! CLI smoke tests for the usermgmt-server binary
//!
//! These tests verify that the CLI commands work correctly, including
//! configuration validation, help output, and a real startup.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Helper to run the usermgmt-server binary with given arguments
fn run_usermgmt_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_usermgmt-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute usermgmt-server")
}

/// Config rooted in `home` so nothing is written outside the temp dir.
fn write_config(home: &Path, extra: &str) -> std::path::PathBuf {
    let config_path = home.join("config.yaml");
    let content = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 8087

database:
  url: "sqlite://database/users.db"

logging:
  default:
    console_level: info
    file: "logs/usermgmt.log"
    file_level: info
    max_backups: 3
    max_size_mb: 10
{extra}"#,
        home = home.to_string_lossy().replace('\\', "/"),
    );
    std::fs::write(&config_path, content).expect("Failed to write config file");
    config_path
}

#[test]
fn test_cli_help_command() {
    let output = run_usermgmt_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("usermgmt-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_usermgmt_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("usermgmt-server 0.1.0"));
}

#[test]
fn test_cli_invalid_command() {
    let output = run_usermgmt_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should report the bad subcommand");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_usermgmt_server(&["-c", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Config file not found"),
        "Should mention config file issue: {}",
        stderr
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_usermgmt_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to load configuration"),
        "Should mention YAML parsing issue: {}",
        stderr
    );
}

#[test]
fn test_cli_check_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        r#"
modules:
  users:
    cache:
      enabled: false
  api_ingress:
    cors_enabled: true
"#,
    );

    let output = run_usermgmt_server(&["--config", config_path.to_str().unwrap(), "check"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "STDOUT: {stdout}\nSTDERR: {stderr}");
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("cors_enabled: true"));
}

#[test]
fn test_cli_check_rejects_malformed_module_section() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        r#"
modules:
  users:
    validation:
      min_username_len: "three"
"#,
    );

    let output = run_usermgmt_server(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("users"), "Should name the module: {stderr}");
}

#[test]
fn test_cli_print_config_applies_overrides() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "");

    let output = run_usermgmt_server(&[
        "--config",
        config_path.to_str().unwrap(),
        "--port",
        "9123",
        "--mock",
        "--print-config",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9123"), "{stdout}");
    assert!(stdout.contains("sqlite::memory:"), "{stdout}");
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_usermgmt_server(&["run", "--help"]);
    assert!(output.status.success(), "Run subcommand help should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Start the server"));

    let output = run_usermgmt_server(&["check", "--help"]);
    assert!(output.status.success(), "Check subcommand help should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Check configuration"));
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn http_get(port: u16, path: &str) -> Option<String> {
    let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.ok()?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.ok()?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await.ok()?;
    Some(response)
}

#[tokio::test]
async fn test_cli_run_with_mock_database_serves_health() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "");
    let port = free_port().to_string();

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_usermgmt-server"))
        .args(["--config", config_path.to_str().unwrap(), "--mock", "--port", &port, "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn usermgmt-server");

    let port: u16 = port.parse().unwrap();
    let mut health = None;
    for _ in 0..100 {
        if let Some(resp) = http_get(port, "/health").await {
            health = Some(resp);
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let health = health.expect("server did not come up");
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.contains("\"status\":\"UP\""), "{health}");

    let users = http_get(port, "/users").await.unwrap();
    assert!(users.starts_with("HTTP/1.1 200"), "{users}");
    assert!(users.contains("x-request-id"), "{users}");

    child.kill().await.unwrap();
}
