//! Tests for exit codes of completed runs.

mod helpers;

use std::net::TcpListener;
use std::process::Command;

use tempfile::TempDir;

use helpers::{config, mixed_catalog, run};
use wsus_curator::{Config, MutationKind};

#[tokio::test]
async fn test_clean_run_exits_zero() {
    let dir = TempDir::new().unwrap();
    let report = run(&mixed_catalog(), &config(&dir)).await.unwrap();
    assert_eq!(report.exit_code(), 0, "A run without failures should exit 0");
}

#[tokio::test]
async fn test_failed_mutation_exits_two() {
    let dir = TempDir::new().unwrap();
    let server = mixed_catalog().failing(MutationKind::Approve, "keep-sec");
    let report = run(&server, &config(&dir)).await.unwrap();
    assert_eq!(
        report.exit_code(),
        2,
        "A run that continued past a failed mutation should exit 2"
    );
}

#[tokio::test]
async fn test_dry_run_never_fails_mutations() {
    let dir = TempDir::new().unwrap();
    // The scripted failure is never reached: a dry run issues no mutation.
    let server = mixed_catalog().failing(MutationKind::Decline, "arm");
    let config = Config {
        dry_run: true,
        ..config(&dir)
    };
    let report = run(&server, &config).await.unwrap();
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_unreachable_server_exits_one() {
    // Grab a free port, then release it so nothing is listening there
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = TempDir::new().unwrap();
    let log_file = dir.path().join("actions.log");

    let output = Command::new(env!("CARGO_BIN_EXE_wsus_curator"))
        .current_dir(dir.path())
        .env_remove("WSUS_SERVER")
        .env_remove("WSUS_PORT")
        .env_remove("WSUS_USE_TLS")
        .env_remove("WSUS_API_TOKEN")
        .args(["--server", "127.0.0.1", "--port", &port.to_string(), "--no-sync"])
        .arg("--log-file")
        .arg(&log_file)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "A fatal error should exit 1");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to connect"), "stderr was: {stderr}");
    assert!(!log_file.exists(), "Nothing should be logged before connecting");
}
