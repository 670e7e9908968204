mod cli;
mod connect;
mod error_fmt;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Cli, FILE_GUARD, JSON_MODE};
use crate::connect::{connect, effective_config, exit_code, outcome_json, parameters};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("color-eyre already installed: {e}");
    }

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> eyre::Result<i32> {
    let cfg = effective_config(cli)?;
    init_tracing(cli, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, test = cli.test, "starting");

    if cli.debug {
        print!("{}", parameters(&cfg, cli.test)?);
        return Ok(0);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let outcome = connect(&cfg, cli.test, shutdown)?;
    tracing::info!(?outcome, "run finished");
    if cli.json {
        println!("{}", outcome_json(outcome));
    }
    Ok(exit_code(outcome))
}

/// Console layer on stderr plus an optional JSON-lines file layer.
fn init_tracing(cli: &Cli, logging: &tm_config::Logging) -> eyre::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(cli.level(logging.level.as_deref())),
    }
    .wrap_err("invalid log filter")?;

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let console = if cli.json {
        console.json().boxed()
    } else {
        console.boxed()
    };

    let file = match &logging.file {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
