use std::io::IsTerminal;
use std::process::ExitCode;

use atlas_extract::{
    cli::{self, Cli, UsageError},
    extract,
};
use clap::{Parser, error::ErrorKind};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(UsageError::HelpRequested) => {
            eprintln!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("error: {e}\n\n{}", cli::usage());
            return ExitCode::FAILURE;
        }
    };

    // Printed directly so they survive any RUST_LOG filter.
    if config.variables.is_empty() {
        eprintln!("warning: no variables requested, the output container will have no variables");
    }

    match extract::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
