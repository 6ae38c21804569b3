//! Hooksmith CLI application
//!
//! Thin front end over `hooksmith-core`: every command builds one
//! `SettingsManager` for the invocation and calls a single engine operation.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/hooksmith-cli
//! ```

mod args;
mod commands;
mod console;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use args::Cli;
use console::CLIConsole;
use hooksmith_core::SettingsError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG takes precedence; --verbose raises the default to debug
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let console = CLIConsole::new(cli.verbose);
    match commands::run(&cli, &console) {
        Ok(code) => code,
        Err(err) => {
            report_error(&console, &err);
            ExitCode::FAILURE
        }
    }
}

fn report_error(console: &CLIConsole, err: &anyhow::Error) {
    match err.downcast_ref::<SettingsError>() {
        Some(settings_error) => {
            console.error(&format!("[{}] {:#}", settings_error.error_code(), err));
            for issue in settings_error.issues() {
                console.error(&format!("  {}", issue));
            }
        }
        None => console.error(&format!("{:#}", err)),
    }
}
