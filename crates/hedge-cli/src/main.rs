mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "warn,hedge=info";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let envelope = commands::run(&cli, &config).await?;
    output::render(&envelope, cli.pretty)?;

    // The envelope already carries the failure; the exit code keeps its kind.
    match &envelope.error {
        Some(error) => Ok(ExitCode::from(error.exit_code)),
        None => Ok(ExitCode::SUCCESS),
    }
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
