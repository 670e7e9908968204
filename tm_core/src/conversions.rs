//! `From` implementations bridging `tm_config` types to `tm_core` types.

use std::time::Duration;

use crate::config::{Layout, MonitorCfg, PersistCfg, ProvisionCfg, RunCfg};

impl From<&tm_config::Config> for Layout {
    fn from(c: &tm_config::Config) -> Self {
        Self {
            list_rows: c.display.list_rows,
            char_window: c.display.char_window,
            list_poll: Duration::from_millis(c.timing.list_poll_ms),
            chars_poll: Duration::from_millis(c.timing.chars_poll_ms),
        }
    }
}

impl From<&tm_config::MonitorCfg> for MonitorCfg {
    fn from(c: &tm_config::MonitorCfg) -> Self {
        Self {
            initial_attempts: c.initial_attempts,
            final_attempts: c.final_attempts,
            jitter_min: Duration::from_millis(c.jitter_min_ms),
            jitter_max: Duration::from_millis(c.jitter_max_ms),
            ip_attempts: c.ip_attempts,
            ip_wait: Duration::from_millis(c.ip_wait_ms),
        }
    }
}

impl From<&tm_config::Network> for PersistCfg {
    fn from(c: &tm_config::Network) -> Self {
        Self {
            wpa_path: c.wpa_path.clone(),
            staging_path: c.staging_path(),
            backup: c.backup,
            privileged: c.privileged,
            owner: c.owner.clone(),
            group: c.group.clone(),
        }
    }
}

impl From<&tm_config::Config> for ProvisionCfg {
    fn from(c: &tm_config::Config) -> Self {
        Self {
            interface: c.network.interface.clone(),
            scan_timeout: Duration::from_millis(c.timing.scan_timeout_ms),
            sleep_time: Duration::from_secs(c.timing.sleep_time_s),
            test_mode: false,
            persist: (&c.network).into(),
        }
    }
}

impl From<&tm_config::Config> for RunCfg {
    fn from(c: &tm_config::Config) -> Self {
        Self {
            monitor: (&c.monitor).into(),
            provision: c.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_over() {
        let cfg = tm_config::Config::default();
        let run = RunCfg::from(&cfg);
        assert_eq!(run.monitor, MonitorCfg::default());
        assert_eq!(run.sleep_time(), Duration::from_secs(10));
        assert!(!run.test_mode());
        assert_eq!(Layout::from(&cfg), Layout::default());
        assert_eq!(
            run.provision.persist.backup_path(),
            std::path::PathBuf::from("/etc/wpa_supplicant/wpa_supplicant.conf.bak")
        );
    }
}
