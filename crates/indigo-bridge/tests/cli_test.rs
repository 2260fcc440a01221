//! Integration tests for the `indigo-bridge` binary.
//!
//! Argument parsing, config commands and error exits run without any
//! server; the device commands run against a wiremock Indigo.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// The binary with every `INDIGO_*` variable cleared and config
/// directories pointed somewhere that does not exist.
fn bridge_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("indigo-bridge");
    cmd.env("HOME", "/tmp/indigo-bridge-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/indigo-bridge-test-nonexistent")
        .env_remove("INDIGO_BRIDGE_CONFIG")
        .env_remove("INDIGO_HOST")
        .env_remove("INDIGO_PORT")
        .env_remove("INDIGO_USERNAME")
        .env_remove("INDIGO_PASSWORD")
        .env_remove("INDIGO_LISTEN_PORT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn indigo() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1, "name": "Porch Light", "href": "/devices/1",
                "typeSupportsOnOff": true, "typeSupportsDim": true,
                "isOn": true, "brightness": 60
            },
            {
                "id": 2, "name": "Attic Fan", "href": "/devices/2",
                "typeSupportsOnOff": true, "typeSupportsSpeedControl": true,
                "isOn": false, "speedIndex": 0
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "name": "Porch Light",
            "typeSupportsOnOff": true, "typeSupportsDim": true,
            "isOn": true, "brightness": 60
        })))
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let port = server.address().port().to_string();
    let mut full = vec!["--host", "127.0.0.1", "--port", port.as_str()];
    full.extend_from_slice(args);
    let full: Vec<String> = full.into_iter().map(str::to_owned).collect();

    tokio::task::spawn_blocking(move || bridge_cmd().args(full).output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let output = bridge_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    bridge_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("list"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn version_flag() {
    bridge_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("indigo-bridge"));
}

#[test]
fn unknown_characteristic_is_a_usage_error() {
    bridge_cmd()
        .args(["get", "1", "warp-drive"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("warp-drive"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn config_path_honours_the_flag() {
    bridge_cmd()
        .args(["--config", "/tmp/elsewhere/bridge.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/elsewhere/bridge.toml"));
}

#[test]
fn config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    let file = file.to_str().unwrap();

    bridge_cmd()
        .args(["--config", file, "config", "init", "--server", "indigo.local"])
        .assert()
        .success();

    bridge_cmd()
        .args(["--config", file, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("host = \"indigo.local\""));

    // A second init must not clobber the file.
    bridge_cmd()
        .args(["--config", file, "config", "init"])
        .assert()
        .failure();
}

#[test]
fn missing_host_fails_with_a_hint() {
    let output = bridge_cmd().arg("list").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("host"));
}

// ── Against a mock Indigo ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn list_prints_discovered_accessories() {
    let server = indigo().await;
    let output = run_against(&server, &["-o", "plain", "list"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Sorted by name: the fan before the light.
    assert_eq!(stdout.trim(), "2\n1");
}

#[tokio::test(flavor = "multi_thread")]
async fn get_reads_a_characteristic() {
    let server = indigo().await;
    let output = run_against(&server, &["-o", "plain", "get", "1", "brightness"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "60");
}

#[tokio::test(flavor = "multi_thread")]
async fn get_on_an_unknown_id_is_not_found() {
    let server = indigo().await;
    let output = run_against(&server, &["get", "77", "on"]).await;
    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn out_of_range_set_sends_nothing() {
    let server = indigo().await;
    let output = run_against(&server, &["set", "1", "brightness", "150"]).await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    let puts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .count();
    assert_eq!(puts, 0);
}
