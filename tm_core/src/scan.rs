//! WiFi network scan: `iwlist` output to a selectable list.
use std::collections::HashSet;
use std::time::Duration;

use tm_traits::{Clock, Shell};
use tracing::info;

use crate::error::Result;
use crate::hw_error::shell_report;
use crate::retry::{Retry, Wait};

/// Last entry of every scan list; picking it switches to typing the name.
pub const HIDDEN_WIFI: &str = "HIDDEN_WIFI";

/// Pause between failed scan attempts.
const SCAN_RETRY_WAIT: Duration = Duration::from_millis(500);

pub fn scan_cmd(interface: &str) -> String {
    format!("sudo iwlist {interface} scan | grep ESSID:")
}

/// Turn `ESSID:"name"` lines into a distinct, case-insensitively sorted list
/// with [`HIDDEN_WIFI`] appended.
///
/// Lines without an ASCII letter, digit or comma (e.g. hidden SSIDs that
/// show up as `ESSID:""`) are dropped.
pub fn parse_scan(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names: Vec<String> = raw
        .split('\n')
        .map(|line| line.trim_start().replace("ESSID:", "").replace('"', ""))
        .filter(|name| name.chars().any(|c| c.is_ascii_alphanumeric() || c == ','))
        .filter(|name| seen.insert(name.clone()))
        .collect();
    names.sort_by_cached_key(|n| n.to_lowercase());
    names.push(HIDDEN_WIFI.to_string());
    names
}

/// Run the scan until it succeeds or `timeout` of wall-clock time has passed.
pub fn scan_networks<S, C>(
    shell: &mut S,
    clock: &C,
    interface: &str,
    timeout: Duration,
) -> Result<Vec<String>>
where
    S: Shell + ?Sized,
    C: Clock,
{
    let cmd = scan_cmd(interface);
    let raw = Retry::after_delay(timeout)
        .wait(Wait::Fixed(SCAN_RETRY_WAIT))
        .call(clock, || shell.output(&cmd))
        .map_err(|e| shell_report(&e))?;
    let names = parse_scan(&raw);
    info!(count = names.len() - 1, "wifi networks scanned");
    Ok(names)
}
