//! E2E tests for invocation, validation and exit codes

use std::process::{Command, Output};

const CLI_BINARY: &str = env!("CARGO_BIN_EXE_quadpi");

pub fn run_command(args: &[&str]) -> Output {
    Command::new(CLI_BINARY)
        .args(args)
        .output()
        .unwrap_or_else(|_| panic!("Failed to execute {CLI_BINARY}"))
}

#[test]
fn test_zero_argument_invocation() {
    let output = run_command(&[]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "pi: 3.141593\n");
    assert!(output.stderr.is_empty());
}

#[test]
fn test_custom_step_count() {
    let output = run_command(&["--steps", "1"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "pi: 3.200000");
}

#[test]
fn test_zero_steps_is_usage_error() {
    let output = run_command(&["--steps", "0"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_INVALID_STEP_COUNT"));
}

#[test]
fn test_non_numeric_steps_is_usage_error() {
    let output = run_command(&["--steps", "lots"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("'lots'"));
}

#[test]
fn test_zero_workers_is_usage_error() {
    let output = run_command(&["--strategy", "chunked", "--workers", "0"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_INVALID_WORKER_COUNT"));
}

#[test]
fn test_workers_above_ceiling_is_usage_error() {
    let output = run_command(&["--strategy", "chunked", "--workers", "5000"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_INVALID_WORKER_COUNT"));
}

#[test]
fn test_rayon_ignores_pool_environment() {
    let output = Command::new(CLI_BINARY)
        .args(["-n", "1", "-w", "1", "-s", "rayon", "-f", "json"])
        .env("RAYON_NUM_THREADS", "4")
        .output()
        .unwrap_or_else(|_| panic!("Failed to execute {CLI_BINARY}"));

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["workers"], 1);
    assert_eq!(report["pi"], 3.2);
}

#[test]
fn test_every_strategy_prints_reference_value() {
    for strategy in [
        "sequential",
        "chunked",
        "strided",
        "tree",
        "atomic",
        "critical",
        "rayon",
    ] {
        let output = run_command(&["--strategy", strategy, "--workers", "4"]);

        assert!(output.status.success(), "{strategy} failed");
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            "pi: 3.141593\n",
            "{strategy}"
        );
    }
}

#[test]
fn test_help_exits_successfully() {
    let output = run_command(&["--help"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--strategy"));
}

#[test]
fn test_verbose_logs_to_stderr_only() {
    let output = run_command(&["-vv", "--strategy", "chunked", "--workers", "2"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "pi: 3.141593\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("integration finished"));
    assert!(stderr.contains("worker finished"));
}
