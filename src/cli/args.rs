//! CLI argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry.
#[derive(Parser)]
#[command(name = "predscan")]
#[command(about = "Detect anomalous control-flow predicates by pattern mining")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Emit training records for every predicate of a source file
    Dump {
        /// Source file to dump predicates from
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Source language (1=C, 2=Verilog, 3=PHP, 4=C++)
        #[arg(short = 'l', long, default_value_t = 1)]
        language: i32,

        /// Abstraction level (0..3); accepted for compatibility, records
        /// are always emitted at levels ONE and TWO
        #[arg(short = 't', long, default_value_t = 3)]
        level: i32,

        /// Contributor id recorded with every emitted pattern
        #[arg(short = 'g', long, default_value_t = 0)]
        contributor: u64,
    },

    /// Train on a corpus, then scan source files for anomalous predicates
    Scan {
        /// Training corpus of dumped predicate records
        #[arg(short = 't', long)]
        train: PathBuf,

        /// Single source file to scan
        #[arg(
            short = 'e',
            long,
            required_unless_present = "source_list",
            conflicts_with = "source_list"
        )]
        eval_file: Option<PathBuf>,

        /// File listing the source files to scan, one path per line
        #[arg(short = 's', long)]
        source_list: Option<PathBuf>,

        /// Maximum edit distance for suggestions
        #[arg(short = 'c', long, default_value_t = 2)]
        max_cost: usize,

        /// Maximum number of suggestions per predicate
        #[arg(short = 'n', long, default_value_t = 5)]
        max_suggestions: usize,

        /// Thread budget shared between the file sweep and per-file search
        #[arg(short = 'j', long, default_value_t = 1)]
        threads: usize,

        /// Directory for the per-thread scan logs
        #[arg(short = 'o', long, default_value = "/tmp")]
        log_dir: PathBuf,

        /// Anomaly threshold in percent
        #[arg(short = 'a', long, default_value_t = 3.0)]
        anomaly_threshold: f32,

        /// Source language (1=C, 2=Verilog, 3=PHP, 4=C++)
        #[arg(short = 'l', long, default_value_t = 1)]
        language: i32,

        /// Report verbosity (0=errors, 1=info, 2=debug)
        #[arg(short = 'v', long, default_value_t = 0)]
        verbosity: i32,
    },
}
