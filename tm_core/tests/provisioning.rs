//! End-to-end provisioning and run outcomes with a simulated network.

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use tm_core::mocks::{
    Action, CommandLog, DrawLog, RecordingRenderer, Reply, ScriptClock, ScriptedInput,
    ScriptedShell, SimNet,
};
use tm_core::net::{REBOOT_CMD, RELOAD_CMD};
use tm_core::{
    CharSet, Device, MonitorCfg, Outcome, PersistCfg, ProvisionCfg, RunCfg, TmError,
};
use tm_traits::Signal;

type TestDevice = Device<ScriptedInput, RecordingRenderer, ScriptClock, ScriptedShell>;

const SELECT: Action = Action::Press(Signal::Select);
const STOP: Action = Action::Press(Signal::Stop);

fn device(actions: Vec<Action>, shell: ScriptedShell) -> (TestDevice, DrawLog, CommandLog) {
    let input = ScriptedInput::new(actions);
    let screen = RecordingRenderer::new();
    let draws = screen.log();
    let commands = shell.log();
    let dev = Device::builder()
        .with_clock(input.clock())
        .with_input(input)
        .with_screen(screen)
        .with_shell(shell)
        .build()
        .unwrap();
    (dev, draws, commands)
}

fn run_cfg(wpa_path: &Path, test_mode: bool) -> RunCfg {
    RunCfg {
        monitor: MonitorCfg::default(),
        provision: ProvisionCfg {
            interface: "wlan0".into(),
            scan_timeout: Duration::from_secs(10),
            sleep_time: Duration::from_secs(10),
            test_mode,
            persist: PersistCfg::unprivileged(wpa_path),
        },
    }
}

/// Country `CA`, first scanned network, passkey, no extra fields.
fn provisioning_script(passkey: &str) -> Vec<Action> {
    let mut s = vec![Action::Turn(1), SELECT, SELECT];
    s.extend(Action::typing(&CharSet::printable(), passkey));
    s.extend([STOP, SELECT]);
    s
}

#[test]
fn provisioning_writes_the_supplicant_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wpa_supplicant.conf");
    let cfg = run_cfg(&path, false);
    let (mut dev, draws, commands) = device(
        provisioning_script("pass1234"),
        ScriptedShell::simulated_network(SimNet::Offline),
    );

    let cred = dev.provision(&cfg.provision).unwrap();
    assert_eq!(cred.ssid, "HomeNet");
    assert_eq!(cred.passkey, "pass1234");
    assert_eq!(cred.country, "CA");

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("country=CA\n"));
    assert!(text.contains("        ssid=\"HomeNet\"\n"));
    assert!(text.contains("        psk=\"pass1234\"\n"));
    assert_eq!(commands.count(RELOAD_CMD), 1);
    assert!(draws.contains("wifi:\nHomeNet\npasskey:\npass1234"));
    assert!(draws.contains("wifi connecting"));
}

#[test]
fn hidden_network_and_extra_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wpa_supplicant.conf");
    let cfg = run_cfg(&path, false);
    let printable = CharSet::printable();

    // US; HIDDEN_WIFI is last after HomeNet and Neighbor
    let mut script = vec![SELECT, Action::Turn(2), SELECT];
    script.extend(Action::typing(&printable, "Attic"));
    script.push(STOP);
    // open network: empty passkey
    script.push(STOP);
    // yes, scan_ssid = 1, no
    script.extend([Action::Turn(1), SELECT, Action::Turn(1), SELECT]);
    script.extend(Action::typing(&printable, "1"));
    script.extend([STOP, SELECT]);

    let (mut dev, _, _) = device(script, ScriptedShell::simulated_network(SimNet::Offline));
    let cred = dev.provision(&cfg.provision).unwrap();
    assert_eq!(cred.ssid, "Attic");
    assert!(cred.is_open());
    assert_eq!(cred.extra.get("scan_ssid"), Some("1"));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("key_mgmt=NONE\n        priority=0\n        scan_ssid=1\n}"));
}

#[test]
fn failed_scan_surfaces_as_shell_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = run_cfg(&dir.path().join("wpa.conf"), false);
    cfg.provision.scan_timeout = Duration::from_millis(1200);
    let shell = ScriptedShell::new().on("iwlist", Reply::Fail(255));
    let (mut dev, _, commands) = device(vec![SELECT], shell);

    let err = dev.provision(&cfg.provision).unwrap_err();
    assert!(matches!(err.downcast_ref::<TmError>(), Some(TmError::Shell(_))));
    assert!(commands.count("iwlist") >= 2);
}

#[test]
fn online_device_skips_provisioning() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = run_cfg(&dir.path().join("wpa.conf"), false);
    let (mut dev, draws, commands) =
        device(Vec::new(), ScriptedShell::simulated_network(SimNet::Online));

    let outcome = dev.run(&cfg).unwrap();
    assert_eq!(
        outcome,
        Outcome::Connected {
            ip: Some(Ipv4Addr::new(192, 168, 1, 23))
        }
    );
    assert!(draws.contains("Wifi connected\n192.168.1.23"));
    assert!(draws.contains("b8:27:eb:12:34:56"));
    assert_eq!(commands.count("iwlist"), 0);
}

#[test]
fn offline_device_provisions_then_reboots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wpa.conf");
    let cfg = run_cfg(&path, false);
    let (mut dev, draws, commands) = device(
        provisioning_script("secret99"),
        ScriptedShell::simulated_network(SimNet::Offline),
    );

    assert_eq!(dev.run(&cfg).unwrap(), Outcome::Reboot);
    assert!(path.exists());
    assert!(draws.contains("Wifi not connected\nwlan0"));
    assert!(draws.contains("Rebooting"));
    assert_eq!(commands.count(REBOOT_CMD), 1);
    // three monitor restarts plus the post-provisioning reload
    assert_eq!(commands.count(RELOAD_CMD), 4);
}

#[test]
fn device_joins_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wpa.conf");
    let cfg = run_cfg(&path, false);
    let (mut dev, _, commands) = device(
        provisioning_script("secret99"),
        ScriptedShell::simulated_network(SimNet::JoinAfterReload),
    );

    let outcome = dev.run(&cfg).unwrap();
    assert!(matches!(outcome, Outcome::Connected { ip: Some(_) }));
    assert_eq!(commands.count(REBOOT_CMD), 0);
}

#[test]
fn test_mode_provisions_without_reload_or_reboot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wpa.conf");
    let cfg = run_cfg(&path, true);
    let (mut dev, _, commands) = device(
        provisioning_script("secret99"),
        ScriptedShell::simulated_network(SimNet::Offline),
    );

    assert_eq!(dev.run(&cfg).unwrap(), Outcome::Reboot);
    assert!(path.exists());
    assert_eq!(commands.count(RELOAD_CMD), 0);
    assert_eq!(commands.count(REBOOT_CMD), 0);
}

#[test]
fn test_mode_provisions_even_when_online() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wpa.conf");
    let cfg = run_cfg(&path, true);
    let (mut dev, _, _) = device(
        provisioning_script("secret99"),
        ScriptedShell::simulated_network(SimNet::Online),
    );

    assert!(matches!(dev.run(&cfg).unwrap(), Outcome::Connected { .. }));
    assert!(fs::read_to_string(&path).unwrap().contains("psk=\"secret99\""));
}

#[test]
fn run_errors_are_shown_on_the_panel() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = run_cfg(&dir.path().join("missing").join("wpa.conf"), false);
    let (mut dev, draws, _) = device(
        provisioning_script("secret99"),
        ScriptedShell::simulated_network(SimNet::Offline),
    );

    let err = dev.run(&cfg).unwrap_err();
    assert!(matches!(err.downcast_ref::<TmError>(), Some(TmError::Persist(_))));
    assert!(draws.texts().iter().any(|t| t.starts_with("Error\n")));
}
