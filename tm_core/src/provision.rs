//! The provisioning workflow: country, network, passkey, extra fields,
//! then install the supplicant config and ask the supplicant to reload.
use std::time::Duration;

use tm_traits::{Clock, InputSource, Renderer, Shell, Tone};
use tracing::{info, warn};

use crate::charset::CharSet;
use crate::config::ProvisionCfg;
use crate::device::{Device, DeviceUi};
use crate::error::Result;
use crate::net::{RELOAD_CMD, reload_supplicant};
use crate::scan::{HIDDEN_WIFI, scan_networks};
use crate::selection::ChoiceSource;
use crate::supplicant::write_credential;
use crate::types::WifiCredential;

pub const COUNTRIES: [&str; 6] = ["US", "CA", "GB", "AU", "FR", "other"];

pub const FIELD_NAMES: [&str; 12] = [
    "priority",
    "scan_ssid",
    "key_mgmt",
    "bssid",
    "mode",
    "proto",
    "auth_alg",
    "pairwise",
    "group",
    "eapol_flags",
    "eap",
    "other",
];

const YES_NO: [&str; 2] = ["no", "yes"];

/// How long the scan notice stays up before the list appears.
const SCAN_NOTICE: Duration = Duration::from_secs(1);

impl<I, R, C> DeviceUi<I, R, C>
where
    I: InputSource,
    R: Renderer,
    C: Clock,
{
    /// Character entry that asks again until something was typed.
    fn select_nonempty(&mut self, header: &str, label: &str, set: &CharSet) -> Result<String> {
        loop {
            let text = self.select_chars(header, label, set)?;
            if !text.is_empty() {
                return Ok(text);
            }
            warn!(prompt = header, "empty entry, asking again");
        }
    }

    fn ask_yes(&mut self, header: &str) -> Result<bool> {
        Ok(self.select_option(header, ChoiceSource::fixed(YES_NO))? == "yes")
    }
}

impl<I, R, C, S> Device<I, R, C, S>
where
    I: InputSource,
    R: Renderer,
    C: Clock + Clone,
    S: Shell,
{
    /// Walk the user through every selection and return the credential.
    pub fn collect_credentials(&mut self, cfg: &ProvisionCfg) -> Result<WifiCredential> {
        let printable = CharSet::printable();
        let Device { ui, shell } = self;

        let country = ui.select_option(
            "Country Code\nTurn knob, Select",
            ChoiceSource::fixed(COUNTRIES),
        )?;
        let country = if country == "other" {
            ui.select_nonempty(
                "2 Letter\ncountry code\nSelect. Stop to end",
                "So Far",
                &CharSet::uppercase(),
            )?
        } else {
            country
        };

        ui.show("scanning networks\npress rewind\nto re-scan", Tone::Header)?;
        ui.pause(SCAN_NOTICE);
        let clock = ui.clock().clone();
        let scan = ChoiceSource::producer(|| {
            scan_networks(&mut *shell, &clock, &cfg.interface, cfg.scan_timeout)
        });
        let mut ssid = ui.select_option("Select Wifi Name\nTurn knob, Select", scan)?;
        if ssid == HIDDEN_WIFI {
            ssid =
                ui.select_nonempty("Input Wifi Name\nSelect. Stop to end", "So Far", &printable)?;
        }

        let passkey = ui.select_chars("Passkey:Turn knob\nSelect. Stop to end", &ssid, &printable)?;
        let mut cred = WifiCredential::new(ssid, passkey, country);

        let mut more = ui.ask_yes("Extra Fields\nRequired?")?;
        while more {
            let mut name = ui.select_option(
                "Field Name\nTurn knob, Select",
                ChoiceSource::fixed(FIELD_NAMES),
            )?;
            if name == "other" {
                name = ui.select_chars(
                    "Field Name:Turn knob\nSelect. Stop to end",
                    "So Far",
                    &printable,
                )?;
            }
            let value = ui.select_chars(
                "Field Value:Turn knob\nSelect. Stop to end",
                &name,
                &printable,
            )?;
            if name.is_empty() {
                warn!("empty field name, ignoring value");
            } else {
                cred.set_field(name, value);
            }
            more = ui.ask_yes("More Fields\nRequired?")?;
        }

        info!(
            ssid = %cred.ssid,
            country = %cred.country,
            open = cred.is_open(),
            extra = cred.extra.len(),
            "credentials collected"
        );
        Ok(cred)
    }

    /// Collect credentials, install them and signal the supplicant.
    pub fn provision(&mut self, cfg: &ProvisionCfg) -> Result<WifiCredential> {
        let cred = self.collect_credentials(cfg)?;
        self.ui.show(
            &format!("wifi:\n{}\npasskey:\n{}", cred.ssid, cred.passkey),
            Tone::Info,
        )?;
        write_credential(&mut self.shell, &cfg.persist, &cred)?;
        if cfg.test_mode {
            info!(cmd = RELOAD_CMD, "test mode, not issuing command");
        } else {
            reload_supplicant(&mut self.shell);
        }
        self.ui.show("wifi connecting", Tone::Header)?;
        self.ui.pause(cfg.sleep_time);
        Ok(cred)
    }
}
