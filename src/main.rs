//! redis-exclusive: command-line worker for distributed locks.
//!
//! This is the main entry point for the `redis-exclusive` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and handles
//! errors with proper exit codes.

mod cli;
mod commands;

use cli::Cli;
use redis_exclusive::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Logs go to stderr so stdout stays reserved for command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
