//! Link, address and housekeeping commands for the wireless interface.
use std::net::Ipv4Addr;
use std::path::Path;

use tm_traits::Shell;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::hw_error::shell_report;

pub const LINK_CMD: &str = "iwconfig";
pub const IP_CMD: &str = "hostname -I";
pub const MAC_CMD: &str = "ifconfig -a | awk '/ether/{print $2}'";
pub const RELOAD_CMD: &str = "sudo killall -HUP wpa_supplicant";
pub const RFKILL_CMD: &str = "sudo rfkill unblock wifi";
pub const REBOOT_CMD: &str = "sudo reboot";

pub fn interface_up_cmd(interface: &str) -> String {
    format!("sudo ifconfig {interface} up")
}

/// The first `iwconfig` line carries `ESSID:"name"` as its fourth token when
/// associated and `ESSID:off/any` otherwise.
pub fn link_associated(iwconfig: &str) -> bool {
    iwconfig
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(3))
        .is_some_and(|tok| tok.replace("ESSID:", "").contains('"'))
}

/// First space-separated token of `hostname -I`, if it is an IPv4 address.
pub fn parse_ip(out: &str) -> Option<Ipv4Addr> {
    out.split(' ').next()?.trim().parse().ok()
}

/// Whether the interface is associated. Reports down without asking the OS
/// when there is no supplicant file yet.
pub fn check_link<S: Shell + ?Sized>(shell: &mut S, wpa_path: &Path) -> bool {
    if !wpa_path.exists() {
        debug!(path = %wpa_path.display(), "no supplicant config, link down");
        return false;
    }
    match shell.output(LINK_CMD) {
        Ok(out) => {
            let up = link_associated(&out);
            info!(associated = up, "wifi link checked");
            up
        }
        Err(e) => {
            warn!(error = %e, "link check failed");
            false
        }
    }
}

pub fn read_ip<S: Shell + ?Sized>(shell: &mut S) -> Option<Ipv4Addr> {
    match shell.output(IP_CMD) {
        Ok(out) => parse_ip(&out),
        Err(e) => {
            warn!(error = %e, "reading ip failed");
            None
        }
    }
}

/// Hardware address of the first interface that has one, or `"fail"`.
pub fn mac_address<S: Shell + ?Sized>(shell: &mut S) -> String {
    match shell.output(MAC_CMD) {
        Ok(out) => match out.lines().map(str::trim).find(|l| !l.is_empty()) {
            Some(mac) => mac.to_string(),
            None => "fail".to_string(),
        },
        Err(e) => {
            debug!(error = %e, "mac lookup failed");
            "fail".to_string()
        }
    }
}

/// Tell wpa_supplicant to re-read its config. Failures are logged only.
pub fn reload_supplicant<S: Shell + ?Sized>(shell: &mut S) -> bool {
    match shell.status(RELOAD_CMD) {
        Ok(true) => true,
        Ok(false) => {
            warn!(cmd = RELOAD_CMD, "reload exited non-zero");
            false
        }
        Err(e) => {
            warn!(cmd = RELOAD_CMD, error = %e, "reload failed");
            false
        }
    }
}

/// Unblock the radio and bring the interface up. Failures are logged only.
pub fn prepare_interface<S: Shell + ?Sized>(shell: &mut S, interface: &str) {
    for cmd in [RFKILL_CMD.to_string(), interface_up_cmd(interface)] {
        match shell.status(&cmd) {
            Ok(true) => debug!(cmd = %cmd, "ok"),
            Ok(false) => warn!(cmd = %cmd, "exited non-zero"),
            Err(e) => warn!(cmd = %cmd, error = %e, "failed"),
        }
    }
}

pub fn reboot<S: Shell + ?Sized>(shell: &mut S) -> Result<()> {
    info!("rebooting");
    shell.status(REBOOT_CMD).map_err(|e| shell_report(&e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("wlan0     IEEE 802.11  ESSID:\"HomeNet\"  \n  Mode:Managed", true)]
    #[case("wlan0     IEEE 802.11  ESSID:off/any  \n", false)]
    #[case("wlan0     no wireless extensions.", false)]
    #[case("lo", false)]
    #[case("", false)]
    fn link_status_from_fourth_token(#[case] out: &str, #[case] up: bool) {
        assert_eq!(link_associated(out), up);
    }

    #[rstest]
    #[case("192.168.1.23 fd00::1 \n", Some(Ipv4Addr::new(192, 168, 1, 23)))]
    #[case("10.0.0.2\n", Some(Ipv4Addr::new(10, 0, 0, 2)))]
    #[case("\n", None)]
    #[case("fd00::1 \n", None)]
    #[case("", None)]
    fn ip_from_first_token(#[case] out: &str, #[case] ip: Option<Ipv4Addr>) {
        assert_eq!(parse_ip(out), ip);
    }
}
