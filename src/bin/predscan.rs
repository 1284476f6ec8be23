//! predscan - anomaly detection for control-flow predicates.
//!
//! `dump` harvests training records from source files; `scan` trains on a
//! corpus of such records and reports predicates whose shape is rare
//! compared to its near neighbors.

use std::process;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use predscan::cli::{commands, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = commands::execute(cli.command) {
        eprintln!("{}: {error:#}", "Error".red().bold());
        process::exit(1);
    }
}
