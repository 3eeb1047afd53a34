//! benchtrail - benchmark history and regression detection for CI
//!
//! Binary entry point for the ingestion tool.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use benchtrail::cli::{self, Args};

/// Exit status for normalization, store and configuration errors
const ERROR_EXIT: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(report) => {
            eprintln!("Error: {report:?}");
            ExitCode::from(ERROR_EXIT)
        }
    }
}

/// Run one ingestion and map its outcome to an exit code.
fn run(args: &Args) -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let report = cli::run(args)?;
    Ok(ExitCode::from(report.exit.code() as u8))
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
