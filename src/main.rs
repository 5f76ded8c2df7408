use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fftbench::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = cli.into_config().and_then(fftbench::run);
    match result {
        Ok(summary) => {
            info!(
                figures = summary.figures,
                in_document = summary.figures_in_document,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}
