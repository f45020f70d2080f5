//! CLI smoke tests for the rankpilot-server binary.

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Helper to run the rankpilot-server binary with given arguments
fn run_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_rankpilot-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute rankpilot-server")
}

#[test]
fn test_cli_help_command() {
    let output = run_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rankpilot-server"), "Should contain binary name");
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should contain usage information"
    );
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"), "Should print the version");
}

#[test]
fn test_cli_check_with_config_file() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "server:\n  host: 127.0.0.1\n  port: 9101\ndatabase:\n  url: \"sqlite://:memory:\"\n  max_conns: 2\nlogging:\n  level: info\nbilling:\n  products:\n    prod_pro: pro\n"
    )
    .expect("write config");

    let path = file.path().to_string_lossy().to_string();
    let output = run_server(&["--config", &path, "check"]);

    assert!(output.status.success(), "Check command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("9101"), "Should echo the configured port");
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let output = run_server(&["--print-config", "--port", "9999"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("9999"), "Port override should appear in output");
}

#[test]
fn test_cli_rejects_unknown_config_keys() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "server:\n  host: 127.0.0.1\n  port: 9101\n  not_a_key: true\n").expect("write");

    let path = file.path().to_string_lossy().to_string();
    let output = run_server(&["--config", &path, "check"]);

    assert!(!output.status.success(), "Unknown keys should be rejected");
}
