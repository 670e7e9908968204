//! Config mapping, device assembly and the top-level run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use tm_config::Config;
use tm_core::mocks::{Action, ScriptedInput, ScriptedShell, SimNet};
use tm_core::{Device, Layout, Outcome, RunCfg};
use tm_hardware::TermRenderer;
use tm_traits::Signal;

use crate::cli::Cli;

/// Input script for the simulated backend.
pub const SIM_SCRIPT_ENV: &str = "TM_SIM_SCRIPT";
/// `online`, `offline` or `join` for the simulated backend.
pub const SIM_NET_ENV: &str = "TM_SIM_NET";

/// File config (or defaults) with command-line overrides applied.
pub fn effective_config(cli: &Cli) -> eyre::Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => tm_config::load_file(path)?,
        None => Config::default(),
    };
    if let Some(path) = &cli.wpa_path {
        cfg.network.wpa_path.clone_from(path);
    }
    if let Some(secs) = cli.sleep_time {
        cfg.timing.sleep_time_s = secs;
    }
    cfg.validate().wrap_err("invalid command-line override")?;
    Ok(cfg)
}

pub fn run_cfg(cfg: &Config, test_mode: bool) -> RunCfg {
    let mut run = RunCfg::from(cfg);
    run.set_test_mode(test_mode);
    run
}

/// What `--debug` prints: the effective config as TOML.
pub fn parameters(cfg: &Config, test_mode: bool) -> eyre::Result<String> {
    let body = toml::to_string_pretty(cfg).wrap_err("serialize effective config")?;
    Ok(format!("# test_mode = {test_mode}\n{body}"))
}

fn panel(cfg: &Config) -> TermRenderer {
    TermRenderer::new(cfg.display.width, cfg.display.height, Box::new(std::io::stdout()))
        .with_ansi(cfg.display.ansi)
}

fn sim_net() -> eyre::Result<SimNet> {
    match std::env::var(SIM_NET_ENV).as_deref() {
        Err(_) | Ok("online") => Ok(SimNet::Online),
        Ok("offline") => Ok(SimNet::Offline),
        Ok("join") => Ok(SimNet::JoinAfterReload),
        Ok(other) => eyre::bail!("{SIM_NET_ENV} must be online, offline or join, got {other:?}"),
    }
}

/// Whether this run talks to the simulated backend.
pub fn simulated() -> bool {
    !cfg!(all(feature = "hardware", target_os = "linux"))
        || std::env::var_os(SIM_SCRIPT_ENV).is_some()
}

/// Assemble the device for this build and run the top-level flow.
pub fn connect(cfg: &Config, test_mode: bool, shutdown: Arc<AtomicBool>) -> eyre::Result<Outcome> {
    let run = run_cfg(cfg, test_mode);
    let layout = Layout::from(cfg);
    if simulated() {
        return connect_simulated(cfg, &run, layout, shutdown);
    }
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        connect_hardware(cfg, &run, layout, shutdown)
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        eyre::bail!("hardware backend not compiled in")
    }
}

fn connect_simulated(
    cfg: &Config,
    run: &RunCfg,
    layout: Layout,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<Outcome> {
    let script = std::env::var(SIM_SCRIPT_ENV).unwrap_or_default();
    let actions =
        Action::parse_script(&script).wrap_err_with(|| format!("parse {SIM_SCRIPT_ENV}"))?;
    let net = sim_net()?;
    tracing::info!(actions = actions.len(), ?net, "simulated backend");

    let input = ScriptedInput::new(actions).abort_when_exhausted(shutdown.clone());
    install_ctrlc(&shutdown, {
        let input = input.clone();
        move || input.press(Signal::Stop)
    });
    let mut device = Device::builder()
        .with_layout(layout)
        .with_abort(shutdown)
        .with_clock(input.clock())
        .with_input(input)
        .with_screen(panel(cfg))
        .with_shell(ScriptedShell::simulated_network(net))
        .build()?;
    device.run(run)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn connect_hardware(
    cfg: &Config,
    run: &RunCfg,
    layout: Layout,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<Outcome> {
    use std::time::Duration;
    use tm_core::{Retry, TmError, Wait};
    use tm_hardware::{GpioInput, GpioLayout, SignalBoard, SystemShell};
    use tm_traits::MonotonicClock;

    let pins = &cfg.pins;
    let gpio = GpioLayout {
        encoder_a: pins.encoder_a,
        encoder_b: pins.encoder_b,
        select: pins.select,
        stop: pins.stop,
        rewind: pins.rewind,
        wake: pins.wake.clone(),
        debounce: Duration::from_millis(pins.debounce_ms),
    };
    let board = Arc::new(SignalBoard::default());
    let clock = MonotonicClock::new();
    let input = Retry::after_delay(Duration::from_millis(cfg.timing.hw_init_timeout_ms))
        .wait(Wait::Fixed(HW_INIT_RETRY))
        .call(&clock, || GpioInput::new(&gpio, board.clone()))
        .map_err(|e| TmError::HardwareInit(e.to_string()))?;
    tracing::info!(?gpio, "gpio input ready");

    install_ctrlc(&shutdown, {
        let board = board.clone();
        move || {
            board.press(Signal::Stop);
            board.wake();
        }
    });
    let mut device = Device::builder()
        .with_layout(layout)
        .with_abort(shutdown)
        .with_clock(clock)
        .with_input(input)
        .with_screen(panel(cfg))
        .with_shell(SystemShell::new())
        .build()?;
    device.run(run)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
const HW_INIT_RETRY: std::time::Duration = std::time::Duration::from_millis(500);

/// Ctrl-C raises the abort flag, then lets the input cut any wait short.
fn install_ctrlc(shutdown: &Arc<AtomicBool>, nudge: impl Fn() + Send + 'static) {
    let flag = shutdown.clone();
    let res = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Release);
        nudge();
    });
    if let Err(e) = res {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
}

/// Stable process exit code for a finished run.
pub fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Connected { .. } => 0,
        Outcome::Reboot => 3,
    }
}

pub fn outcome_json(outcome: Outcome) -> String {
    match outcome {
        Outcome::Connected { ip } => serde_json::json!({
            "outcome": "connected",
            "ip": ip.map(|ip| ip.to_string()),
        }),
        Outcome::Reboot => serde_json::json!({ "outcome": "reboot" }),
    }
    .to_string()
}
