//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "tm",
    version,
    about = "WiFi provisioning console for a knob-and-button appliance"
)]
pub struct Cli {
    /// Path to config TOML; built-in defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// wpa_supplicant config to write (overrides network.wpa_path)
    #[arg(long = "wpa-path", value_name = "FILE")]
    pub wpa_path: Option<PathBuf>,

    /// Print the effective parameters and exit without running
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Always provision; reload and reboot commands are logged, not issued
    #[arg(long, action = ArgAction::SetTrue)]
    pub test: bool,

    /// Settle time in seconds after reloading the supplicant (overrides timing.sleep_time_s)
    #[arg(long = "sleep-time", value_name = "SECS")]
    pub sleep_time: Option<u64>,

    /// Shorthand for --log-level=debug
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to logging.level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Effective console filter directive.
    pub fn level(&self, file_level: Option<&str>) -> String {
        if self.verbose {
            return "debug".into();
        }
        self.log_level
            .clone()
            .or_else(|| file_level.map(str::to_string))
            .unwrap_or_else(|| "info".into())
    }
}
