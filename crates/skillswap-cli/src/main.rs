mod cli;
mod config;
mod handlers;
mod session;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Display};
use skillswap_types::{ErrorKind, SwapError};

fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let display = Display::new(cli.output);
    match handlers::run(cli, &display) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display.print_error(&format!("{e:#}"));
            exit_code(&e)
        }
    }
}

/// Logs go to stderr so `--output json` stays parseable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("skill_swap=debug,skillswap_core=debug,skillswap_db=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("skill_swap=warn,skillswap_core=warn,skillswap_db=warn")
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    let kind = err
        .downcast_ref::<SwapError>()
        .map_or(ErrorKind::Persistence, SwapError::kind);

    ExitCode::from(match kind {
        ErrorKind::Validation => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Authorization => 4,
        ErrorKind::Conflict => 5,
        ErrorKind::Persistence => 1,
    })
}
