//! Runtime configuration types for the console.
//!
//! These are built from the TOML-deserialized config in `tm_config` (see
//! `conversions`) and carry `Duration`s instead of raw millisecond counts.
use std::path::PathBuf;
use std::time::Duration;

/// Screen geometry and polling cadence of the selection loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Rows in the list window: up to `rows/2` before the cursor, `rows-1` after.
    pub list_rows: usize,
    /// Characters in the entry window.
    pub char_window: usize,
    pub list_poll: Duration,
    pub chars_poll: Duration,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            list_rows: 5,
            char_window: 12,
            list_poll: Duration::from_millis(10),
            chars_poll: Duration::from_millis(100),
        }
    }
}

/// Attempt bounds for link checks and IP polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorCfg {
    pub initial_attempts: u32,
    pub final_attempts: u32,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    pub ip_attempts: u32,
    pub ip_wait: Duration,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            initial_attempts: 4,
            final_attempts: 7,
            jitter_min: Duration::from_millis(1000),
            jitter_max: Duration::from_millis(2000),
            ip_attempts: 5,
            ip_wait: Duration::from_millis(2000),
        }
    }
}

/// Where and how the supplicant file is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistCfg {
    pub wpa_path: PathBuf,
    pub staging_path: PathBuf,
    pub backup: bool,
    pub privileged: bool,
    pub owner: String,
    pub group: String,
}

impl PersistCfg {
    /// Plain file IO into `wpa_path`, staging next to it.
    pub fn unprivileged(wpa_path: impl Into<PathBuf>) -> Self {
        let wpa_path = wpa_path.into();
        let mut staging = wpa_path.clone().into_os_string();
        staging.push(".staging");
        Self {
            staging_path: PathBuf::from(staging),
            wpa_path,
            backup: true,
            privileged: false,
            owner: "root".into(),
            group: "root".into(),
        }
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut p = self.wpa_path.clone().into_os_string();
        p.push(".bak");
        PathBuf::from(p)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionCfg {
    pub interface: String,
    pub scan_timeout: Duration,
    /// Settle time after the supplicant reload.
    pub sleep_time: Duration,
    /// Forced provisioning: destructive commands are logged, not issued.
    pub test_mode: bool,
    pub persist: PersistCfg,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCfg {
    pub monitor: MonitorCfg,
    pub provision: ProvisionCfg,
}

impl RunCfg {
    pub fn test_mode(&self) -> bool {
        self.provision.test_mode
    }

    pub fn set_test_mode(&mut self, on: bool) {
        self.provision.test_mode = on;
    }

    pub fn sleep_time(&self) -> Duration {
        self.provision.sleep_time
    }
}
