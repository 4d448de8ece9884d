#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/unipipe-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn unipipe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_unipipe"));
    cmd.arg("--log-level").arg("error");
    cmd
}

#[test]
fn version_prints_package_version() {
    let output = unipipe()
        .arg("version")
        .output()
        .expect("version command should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_extended_reports_build_provenance() {
    let output = unipipe()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version --extended should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rustc:"));
    assert!(stdout.contains("git_hash:"));
    // The build script captures the compiler version at build time.
    assert!(
        !stdout.contains("rustc: unknown"),
        "rustc version should be populated, got:\n{stdout}"
    );
}

#[test]
fn send_rejects_zero_timeout_as_usage_error() {
    let output = unipipe()
        .arg("send")
        .arg("--value")
        .arg("x")
        .arg("--timeout")
        .arg("0s")
        .output()
        .expect("send command should run");

    assert_eq!(output.status.code(), Some(64), "usage errors exit 64");
}

#[test]
fn send_without_server_times_out() {
    let dir = unique_temp_dir("send-timeout");
    let sock_path = dir.join("bridge.pipe");

    let output = unipipe()
        .arg("send")
        .arg("--socket-path")
        .arg(&sock_path)
        .arg("--value")
        .arg("nobody-home")
        .arg("--timeout")
        .arg("300ms")
        .output()
        .expect("send command should run");

    assert_eq!(output.status.code(), Some(124), "timeouts exit 124");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_receives_one_sent_message() {
    let dir = unique_temp_dir("roundtrip");
    let sock_path = dir.join("bridge.pipe");

    let child = unipipe()
        .arg("--format")
        .arg("raw")
        .arg("listen")
        .arg("BridgeTest")
        .arg("--socket-path")
        .arg(&sock_path)
        .arg("--count")
        .arg("1")
        .arg("--skip-heartbeats")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("listen command should start");

    let send_status = unipipe()
        .arg("send")
        .arg("BridgeTest")
        .arg("--socket-path")
        .arg(&sock_path)
        .arg("--value")
        .arg("hello")
        .arg("--timeout")
        .arg("5s")
        .status()
        .expect("send command should run");
    assert!(send_status.success(), "send should exit 0");

    let output = child
        .wait_with_output()
        .expect("listen should exit after one message");
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(r#"{"kind":"custom","value":"hello"}"#),
        "raw output should carry the wire text, got:\n{stdout}"
    );

    let _ = std::fs::remove_dir_all(&dir);
}
