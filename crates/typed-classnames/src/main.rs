//! typed-classnames: checks JSX class names against the classes your
//! stylesheets define.

mod cli;
mod config;
mod line_index;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let summary = orchestrator::run(args).await.into_diagnostic()?;

    if summary.failed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Logs to stderr, filtered by `RUST_LOG`; `--verbose` raises the default level.
fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .into_diagnostic()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    Ok(())
}
