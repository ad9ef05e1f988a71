//! End-to-end tests of the `maildns` binary that need no network.

use std::io::Write;
use std::process::Command;

fn maildns() -> Command {
    Command::new(env!("CARGO_BIN_EXE_maildns"))
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_validate_accepts_good_config() {
    let config = config_file(
        "resolver:\n  nameservers: [\"192.0.2.53:53\"]\nmx:\n  fallback_mx: relay.example.net\n",
    );

    let output = maildns()
        .args(["validate", "--verbose", "--config"])
        .arg(config.path())
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Configuration is valid"));
    assert!(stdout.contains("relay.example.net"));
}

#[test]
fn test_validate_rejects_bad_config() {
    let config = config_file("logging:\n  format: xml\n");

    let output = maildns()
        .args(["validate", "--config"])
        .arg(config.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration validation failed"));
}

#[test]
fn test_signature_of_literal_needs_no_lookup() {
    let config = config_file("resolver:\n  nameservers: [\"127.0.0.1:9\"]\n");

    let output = maildns()
        .args(["--json", "signature", "[192.0.2.25]", "--config"])
        .arg(config.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["signature"], "[192.0.2.25]");
    assert_eq!(value["groups"][0][1], 0);
}
