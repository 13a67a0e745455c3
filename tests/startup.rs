//! Process exit behaviour on bad startup input.

use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_throttle-proxy"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn throttle-proxy")
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn missing_port_in_target_exits_non_zero() {
    let output = run(&["--target", "http://localhost", "--port", "18090", "--requests", "1"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("port is missing"));
}

#[test]
fn missing_target_exits_non_zero() {
    let output = run(&["--port", "18091", "--requests", "1"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("target: required parameter"));
}

#[test]
fn zero_capacity_exits_non_zero() {
    let output = run(&["--target", "http://127.0.0.1:8000", "--port", "18092", "--requests", "0"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("requests"));
}

#[test]
fn occupied_port_exits_non_zero() {
    let taken = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    let output = run(&["--target", "http://127.0.0.1:8000", "--port", &port, "--requests", "1"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("Could not bind"));
}
