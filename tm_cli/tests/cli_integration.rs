use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

/// Config that keeps everything inside `dir` and uses plain file IO.
fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[network]
wpa_path = "{}"
privileged = false

[timing]
sleep_time_s = 1
{extra}
"#,
        dir.join("wpa_supplicant.conf").display()
    );
    let path = dir.join("tm.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn tm(cfg: &Path, net: &str, script: &str) -> Command {
    let mut cmd = Command::cargo_bin("tm_cli").unwrap();
    cmd.arg("--config")
        .arg(cfg)
        .env_remove("RUST_LOG")
        .env("TM_SIM_NET", net)
        .env("TM_SIM_SCRIPT", script);
    cmd
}

// Country CA, first network, passkey secret99, no extra fields.
const PROVISION: &str = "+1 s s type:secret99 x s";

#[test]
fn help_lists_flags() {
    Command::cargo_bin("tm_cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Usage:")
                .and(predicate::str::contains("--wpa-path"))
                .and(predicate::str::contains("--sleep-time")),
        );
}

#[test]
fn debug_prints_parameters_without_running() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    tm(&cfg, "offline", "")
        .args(["--debug", "--sleep-time", "4"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[network]")
                .and(predicate::str::contains("sleep_time_s = 4"))
                .and(predicate::str::contains("Connecting").not()),
        );
    assert!(!dir.path().join("wpa_supplicant.conf").exists());
}

#[rstest]
#[case("online")]
#[case("join")]
fn connected_runs_exit_zero(#[case] net: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    tm(&cfg, net, PROVISION)
        .assert()
        .code(0)
        .stdout(
            predicate::str::contains("Wifi connected")
                .and(predicate::str::contains("192.168.1.23")),
        );
}

#[test]
fn offline_run_provisions_and_requests_reboot() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    tm(&cfg, "offline", PROVISION)
        .assert()
        .code(3)
        .stdout(
            predicate::str::contains("Wifi not connected")
                .and(predicate::str::contains("Rebooting")),
        );
    let text = fs::read_to_string(dir.path().join("wpa_supplicant.conf")).unwrap();
    assert!(text.contains("country=CA\n"));
    assert!(text.contains("ssid=\"HomeNet\""));
    assert!(text.contains("psk=\"secret99\""));
}

#[test]
fn test_mode_provisions_while_online() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    let target = dir.path().join("override.conf");
    tm(&cfg, "online", PROVISION)
        .arg("--test")
        .arg("--wpa-path")
        .arg(&target)
        .assert()
        .code(0);
    assert!(fs::read_to_string(&target).unwrap().contains("psk=\"secret99\""));
}

#[test]
fn exhausted_script_interrupts() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    tm(&cfg, "offline", "")
        .assert()
        .code(130)
        .stderr(predicate::str::contains("interrupted"));
}

#[rstest]
#[case("list_poll_ms = 0", "timing.list_poll_ms")]
#[case("sleep_time_s = \"ten\"", "parse config")]
fn bad_config_is_explained(#[case] extra: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), extra);
    tm(&cfg, "online", "")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn unknown_sim_network_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    tm(&cfg, "flaky", "")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TM_SIM_NET"));
}
