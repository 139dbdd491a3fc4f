//! shellenv - main entry point.
//!
//! - `path` commands print shell statements on stdout for the caller to `eval`
//! - `history` commands filter and compact the shell history log
//!
//! Logs always go to stderr so stdout stays machine-consumable.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shellenv_cli::cli::{Cli, LogLevel, dispatch_command};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "SHELLENV_LOG";

/// Exit status for failures; 1 is reserved for a discarded history command.
const FAILURE_EXIT: u8 = 2;

fn setup_logging(cli: &Cli) {
    let explicit = if cli.verbose {
        Some(LogLevel::Debug)
    } else {
        cli.log_level
    };

    let filter = match explicit {
        Some(level) => EnvFilter::new(level.as_filter_str()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(LogLevel::default().as_filter_str())),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(&cli);

    match dispatch_command(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("shellenv: {e:#}");
            ExitCode::from(FAILURE_EXIT)
        }
    }
}
