#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the WiFi provisioning console.
//!
//! Every section is optional; a missing file, a missing section and a
//! missing key all fall back to the defaults below. `Config::validate` is
//! the single place that rejects values the runtime cannot work with.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Network {
    /// Supplicant configuration file that provisioning replaces.
    pub wpa_path: PathBuf,
    /// Wireless interface passed to iwlist/ifconfig.
    pub interface: String,
    /// Where the new file is written before it is moved into place.
    /// Defaults to `$HOME`, then the system temp dir.
    pub staging_dir: Option<PathBuf>,
    /// Keep the previous file as `<wpa_path>.bak`.
    pub backup: bool,
    /// Install through `sudo cp/mv/chown` instead of plain file IO.
    pub privileged: bool,
    pub owner: String,
    pub group: String,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            wpa_path: PathBuf::from("/etc/wpa_supplicant/wpa_supplicant.conf"),
            interface: "wlan0".into(),
            staging_dir: None,
            backup: true,
            privileged: true,
            owner: "root".into(),
            group: "root".into(),
        }
    }
}

impl Network {
    /// Staging file path: `<staging dir>/<file name of wpa_path>`.
    pub fn staging_path(&self) -> PathBuf {
        let dir = self
            .staging_dir
            .clone()
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .unwrap_or_else(std::env::temp_dir);
        let name = self
            .wpa_path
            .file_name()
            .map_or_else(|| "wpa_supplicant.conf".into(), ToOwned::to_owned);
        dir.join(name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Timing {
    /// Settle time after a reload/restart before the link is checked (seconds).
    pub sleep_time_s: u64,
    /// Tick interval of the list selection loop.
    pub list_poll_ms: u64,
    /// Tick interval of the character entry loop.
    pub chars_poll_ms: u64,
    /// Wall-clock bound on retrying the WiFi scan.
    pub scan_timeout_ms: u64,
    /// Wall-clock bound on retrying GPIO construction.
    pub hw_init_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            sleep_time_s: 10,
            list_poll_ms: 10,
            chars_poll_ms: 100,
            scan_timeout_ms: 10_000,
            hw_init_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorCfg {
    /// Link checks before provisioning is offered.
    pub initial_attempts: u32,
    /// Association polls after provisioning.
    pub final_attempts: u32,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    /// `hostname -I` polls once associated.
    pub ip_attempts: u32,
    pub ip_wait_ms: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            initial_attempts: 4,
            final_attempts: 7,
            jitter_min_ms: 1000,
            jitter_max_ms: 2000,
            ip_attempts: 5,
            ip_wait_ms: 2000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Display {
    pub width: u32,
    pub height: u32,
    /// Rows of the list selection window.
    pub list_rows: usize,
    /// Characters of the character entry window.
    pub char_window: usize,
    /// Reverse video for highlights in the terminal renderer.
    pub ansi: bool,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            width: 160,
            height: 128,
            list_rows: 5,
            char_window: 12,
            ansi: false,
        }
    }
}

/// BCM pin numbers.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    pub encoder_a: u8,
    pub encoder_b: u8,
    pub select: u8,
    pub stop: u8,
    pub rewind: u8,
    /// Extra buttons that only cut waits short.
    pub wake: Vec<u8>,
    pub debounce_ms: u64,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            encoder_a: 16,
            encoder_b: 22,
            select: 4,
            stop: 3,
            rewind: 2,
            wake: vec![23, 20, 26],
            debounce_ms: 20,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    /// JSON-lines log file; console only when unset.
    pub file: Option<String>,
    /// Filter used when neither RUST_LOG nor `--log-level` is given.
    pub level: Option<String>,
    /// `never`, `daily` or `hourly`. Unset means one file forever.
    pub rotation: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub network: Network,
    pub timing: Timing,
    pub monitor: MonitorCfg,
    pub display: Display,
    pub pins: Pins,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

// Values interpolated into shell command lines.
fn shell_word(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Network
        if self.network.wpa_path.as_os_str().is_empty() {
            eyre::bail!("network.wpa_path must not be empty");
        }
        if self.network.wpa_path.file_name().is_none() {
            eyre::bail!("network.wpa_path must name a file");
        }
        if !shell_word(&self.network.interface) {
            eyre::bail!("network.interface must be a plain interface name");
        }
        if !shell_word(&self.network.owner) {
            eyre::bail!("network.owner must be a plain user name");
        }
        if !shell_word(&self.network.group) {
            eyre::bail!("network.group must be a plain group name");
        }

        // Timing
        if self.timing.sleep_time_s > 60 * 60 {
            eyre::bail!("timing.sleep_time_s is unreasonably large (>1h)");
        }
        if self.timing.list_poll_ms == 0 {
            eyre::bail!("timing.list_poll_ms must be >= 1");
        }
        if self.timing.chars_poll_ms == 0 {
            eyre::bail!("timing.chars_poll_ms must be >= 1");
        }
        if self.timing.scan_timeout_ms == 0 {
            eyre::bail!("timing.scan_timeout_ms must be >= 1");
        }
        if self.timing.hw_init_timeout_ms == 0 {
            eyre::bail!("timing.hw_init_timeout_ms must be >= 1");
        }

        // Monitor
        if self.monitor.initial_attempts == 0 {
            eyre::bail!("monitor.initial_attempts must be >= 1");
        }
        if self.monitor.final_attempts == 0 {
            eyre::bail!("monitor.final_attempts must be >= 1");
        }
        if self.monitor.ip_attempts == 0 {
            eyre::bail!("monitor.ip_attempts must be >= 1");
        }
        if self.monitor.jitter_min_ms > self.monitor.jitter_max_ms {
            eyre::bail!("monitor.jitter_min_ms must be <= monitor.jitter_max_ms");
        }

        // Display
        if self.display.width == 0 || self.display.height == 0 {
            eyre::bail!("display.width and display.height must be > 0");
        }
        if self.display.list_rows == 0 {
            eyre::bail!("display.list_rows must be >= 1");
        }
        if self.display.char_window == 0 {
            eyre::bail!("display.char_window must be >= 1");
        }

        // Pins
        let p = &self.pins;
        let mut seen = HashSet::new();
        for pin in [p.encoder_a, p.encoder_b, p.select, p.stop, p.rewind]
            .into_iter()
            .chain(p.wake.iter().copied())
        {
            if pin > 27 {
                eyre::bail!("pins: BCM pin {pin} is out of range (0..=27)");
            }
            if !seen.insert(pin) {
                eyre::bail!("pins: BCM pin {pin} is assigned twice");
            }
        }
        if p.debounce_ms > 1000 {
            eyre::bail!("pins.debounce_ms is unreasonably large (>1s)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
