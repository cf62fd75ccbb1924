#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn scmibox(args: &[&str]) -> Output {
    scmibox_with_env(args, &[])
}

fn scmibox_with_env(args: &[&str], vars: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scmibox"))
        .args(args)
        .env_remove("SCMIBOX_MEM_DEVICE")
        .env_remove("SCMIBOX_SHMEM_BASE")
        .env_remove("SCMIBOX_SHMEM_SIZE")
        .env("SCMIBOX_LOG_LEVEL", "warn")
        .envs(vars.iter().copied())
        .output()
        .expect("scmibox should run")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

#[test]
fn enable_against_simulator_reports_every_clock() {
    let output = scmibox(&[
        "enable",
        "--simulate",
        "--poll-interval",
        "0us",
        "--settle-delay",
        "0us",
        "--format",
        "json",
    ]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = json_stdout(&output);
    assert_eq!(
        json["schema_id"],
        "https://schemas.3leaps.dev/scmibox/cli/v1/clock-report.schema.json"
    );
    assert_eq!(json["overall"], "pass");

    let configure = json["configure"].as_array().expect("configure array");
    let ids: Vec<u64> = configure
        .iter()
        .map(|o| o["clock_id"].as_u64().expect("clock id"))
        .collect();
    assert_eq!(ids, vec![30, 31, 32, 230, 231, 272]);
    assert!(configure.iter().all(|o| o["command"] == "enable"));

    let rates = json["rates"].as_array().expect("rates array");
    assert_eq!(rates.len(), 6);
    assert_eq!(rates[0]["rate_hz"], 400_000_000u64);
    assert_eq!(rates[5]["rate_hz"], 200_000_000u64);
}

#[test]
fn disable_skips_rate_readback() {
    let output = scmibox(&[
        "disable",
        "--simulate",
        "--poll-interval",
        "0us",
        "--settle-delay",
        "0us",
        "--clocks",
        "30,272",
        "--format",
        "json",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let json = json_stdout(&output);
    let configure = json["configure"].as_array().expect("configure array");
    assert_eq!(configure.len(), 2);
    assert!(configure.iter().all(|o| o["command"] == "disable"));
    assert!(json["rates"].as_array().expect("rates array").is_empty());
}

#[test]
fn rates_subcommand_reads_without_configuring() {
    let output = scmibox(&[
        "rates",
        "--simulate",
        "--poll-interval",
        "0us",
        "--clocks",
        "231",
        "--format",
        "json",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let json = json_stdout(&output);
    assert!(json["configure"].as_array().expect("configure array").is_empty());
    assert_eq!(json["rates"][0]["rate_hz"], 1_600_000_000u64);
    assert_eq!(json["rates"][0]["name"], "gpupll_core");
}

#[test]
fn unknown_clock_id_is_usage_error() {
    let output = scmibox(&["enable", "--simulate", "--clocks", "30,99"]);
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("99"), "stderr: {stderr}");
}

#[test]
fn malformed_base_flag_is_usage_error() {
    let output = scmibox(&["status", "--simulate", "--shmem-base", "0xZZ"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn malformed_base_env_without_subcommand_is_usage_error() {
    let output = scmibox_with_env(&[], &[("SCMIBOX_SHMEM_BASE", "zz")]);
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("zz"), "stderr: {stderr}");
}

#[test]
fn missing_memory_device_is_map_failure() {
    let output = scmibox(&["status", "--device", "/nonexistent/scmibox-mem"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open channel"), "stderr: {stderr}");
}

#[test]
fn status_against_simulator_prints_idle_channel() {
    let output = scmibox(&["status", "--simulate", "--format", "json"]);
    assert_eq!(output.status.code(), Some(0));

    let json = json_stdout(&output);
    assert_eq!(json["channel_status"], 0);
    assert_eq!(json["busy_or_ready"], false);
    assert_eq!(json["payload_capacity"], 25);
}

#[test]
fn undersized_region_is_map_failure() {
    let output = scmibox(&["status", "--simulate", "--shmem-size", "0x40"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn version_prints_package_version() {
    let output = scmibox(&["version"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("scmibox {}", env!("CARGO_PKG_VERSION"))
    );
}
