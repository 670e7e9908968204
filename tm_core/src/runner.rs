//! Top-level run: check the link, provision when needed, then either report
//! the address or reboot.
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use tm_traits::{Clock, InputSource, Point, Renderer, Shell, Tone};
use tracing::{error, info, warn};

use crate::config::RunCfg;
use crate::device::{Device, DeviceUi};
use crate::error::Result;
use crate::monitor::{Link, Monitor};
use crate::net;
use crate::retry::{Retry, Wait};

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Connected { ip: Option<Ipv4Addr> },
    /// Connectivity never came up; a reboot was requested.
    Reboot,
}

const MAC_NOTICE: Duration = Duration::from_secs(1);

/// Adapter that lets the monitor drive the device.
struct DeviceLink<'d, I, R, C, S> {
    device: &'d mut Device<I, R, C, S>,
    wpa_path: PathBuf,
}

impl<I, R, C, S> Link for DeviceLink<'_, I, R, C, S>
where
    I: InputSource,
    R: Renderer,
    C: Clock,
    S: Shell,
{
    fn check(&mut self) -> bool {
        net::check_link(&mut self.device.shell, &self.wpa_path)
    }

    fn restart(&mut self) {
        net::reload_supplicant(&mut self.device.shell);
    }

    fn settle(&mut self, d: Duration) -> bool {
        self.device.ui.pause(d)
    }
}

impl<I, R, C> DeviceUi<I, R, C>
where
    I: InputSource,
    R: Renderer,
    C: Clock,
{
    /// Put a fatal error on the panel; display failures are only logged.
    fn show_fatal(&mut self, err: &eyre::Report) {
        let text = format!("Error\n{err}");
        if let Err(e) = self.show(&text, Tone::Highlight) {
            warn!(error = %e, "could not show error on panel");
        }
    }
}

impl<I, R, C, S> Device<I, R, C, S>
where
    I: InputSource,
    R: Renderer,
    C: Clock + Clone,
    S: Shell,
{
    /// Check the link, provision when it is down (or always in test mode),
    /// then poll for association and an address.
    pub fn run(&mut self, cfg: &RunCfg) -> Result<Outcome> {
        match self.run_inner(cfg) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "run failed");
                self.ui.show_fatal(&e);
                Err(e)
            }
        }
    }

    fn run_inner(&mut self, cfg: &RunCfg) -> Result<Outcome> {
        let test_mode = cfg.test_mode();
        let wpa_path = cfg.provision.persist.wpa_path.clone();
        let iface = cfg.provision.interface.clone();

        self.ui.show("Connecting to WiFi", Tone::Header)?;
        net::prepare_interface(&mut self.shell, &iface);

        let mut connected = net::read_ip(&mut self.shell).is_some();
        if !connected {
            let monitor =
                Monitor::new(cfg.monitor.initial_attempts, cfg.sleep_time()).test_mode(test_mode);
            let mut link = DeviceLink {
                device: self,
                wpa_path: wpa_path.clone(),
            };
            connected = monitor.run(&mut link).connected;
        }
        info!(connected, test_mode, "initial connectivity");

        let mac = net::mac_address(&mut self.shell);
        self.ui
            .show_at(&format!("MAC address\n{mac}"), Point::new(0, 30), Tone::Header)?;
        self.ui.pause(MAC_NOTICE);
        self.ui.check_abort()?;

        if test_mode || !connected {
            self.ui
                .show(&format!("Wifi not connected\n{iface}"), Tone::Header)?;
            self.provision(&cfg.provision)?;
        }

        self.ui.clear_signals();
        self.ui.clear_screen()?;
        self.ui.check_abort()?;

        if !connected {
            let clock = self.ui.clock().clone();
            let shell = &mut self.shell;
            connected = Retry::attempts(cfg.monitor.final_attempts)
                .wait(Wait::Random {
                    min: cfg.monitor.jitter_min,
                    max: cfg.monitor.jitter_max,
                })
                .until(&clock, || net::check_link(&mut *shell, &wpa_path), |up| *up);
        }

        if connected {
            let clock = self.ui.clock().clone();
            let shell = &mut self.shell;
            let ip = Retry::attempts(cfg.monitor.ip_attempts)
                .wait(Wait::Fixed(cfg.monitor.ip_wait))
                .until(&clock, || net::read_ip(&mut *shell), Option::is_some);
            let shown = ip.map_or_else(|| "no address".to_string(), |ip| ip.to_string());
            info!(ip = %shown, "wifi connected");
            self.ui
                .show(&format!("Wifi connected\n{shown}"), Tone::Header)?;
            self.ui.pause(cfg.sleep_time() / 2);
            return Ok(Outcome::Connected { ip });
        }

        warn!("wifi connection failed, rebooting");
        self.ui
            .show("Wifi connection\nfailed\nRebooting", Tone::Highlight)?;
        if test_mode {
            info!(cmd = net::REBOOT_CMD, "test mode, not issuing command");
        } else {
            net::reboot(&mut self.shell)?;
        }
        Ok(Outcome::Reboot)
    }
}
