//! # carbon
//!
//! Command-line front end for `carbon_core`. Every command prints a single
//! JSON document on stdout; logs go to stderr.
//!
//! Exit codes: `0` on success, `2` when the input was rejected by
//! validation, `3` when the ledger is locked by another writer (retrying
//! later may succeed), `1` for anything else (ledger I/O, config).

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;

use carbon_core::calculator::CarbonCalculator;
use carbon_core::errors::CarbonError;
use carbon_core::request::ApiResponse;

use crate::cli::Cli;
use crate::commands::App;
use crate::config::CarbonConfig;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = CarbonConfig::load().context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let app = App {
        calculator: CarbonCalculator::new(),
        ledger_path: cli.ledger.unwrap_or(config.ledger_path),
        user: cli.user.unwrap_or(config.default_user),
        default_scope: config.default_scope,
    };

    match app.dispatch(cli.command) {
        Ok(output) => {
            print_json(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(code = error.error_code(), "command failed");
            print_json(&serde_json::to_value(ApiResponse::<()>::err(&error))?)?;
            if error.is_recoverable() {
                tracing::warn!("ledger is busy, retry once the other writer finishes");
            }
            Ok(ExitCode::from(exit_code(&error)))
        }
    }
}

fn exit_code(error: &CarbonError) -> u8 {
    if error.is_validation() {
        2
    } else if error.is_recoverable() {
        3
    } else {
        1
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("CARBON_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
