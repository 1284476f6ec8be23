//! Argument-parsing contract of the CLI.

use clap::Parser;
use predscan::cli::{Cli, Commands};

#[test]
fn scan_requires_training_corpus() {
    assert!(Cli::try_parse_from(["predscan", "scan", "-e", "file.c"]).is_err());
}

#[test]
fn scan_requires_one_input_selector() {
    assert!(Cli::try_parse_from(["predscan", "scan", "-t", "train.txt"]).is_err());
    assert!(Cli::try_parse_from([
        "predscan", "scan", "-t", "train.txt", "-e", "a.c", "-s", "list.txt"
    ])
    .is_err());
    assert!(Cli::try_parse_from(["predscan", "scan", "-t", "train.txt", "-e", "a.c"]).is_ok());
    assert!(
        Cli::try_parse_from(["predscan", "scan", "-t", "train.txt", "-s", "list.txt"]).is_ok()
    );
}

#[test]
fn scan_defaults_match_the_documented_configuration() {
    let cli = Cli::try_parse_from(["predscan", "scan", "-t", "train.txt", "-e", "a.c"]).unwrap();
    let Commands::Scan {
        max_cost,
        max_suggestions,
        threads,
        log_dir,
        anomaly_threshold,
        language,
        verbosity,
        ..
    } = cli.command
    else {
        panic!("expected scan command");
    };
    assert_eq!(max_cost, 2);
    assert_eq!(max_suggestions, 5);
    assert_eq!(threads, 1);
    assert_eq!(log_dir.to_str(), Some("/tmp"));
    assert_eq!(anomaly_threshold, 3.0);
    assert_eq!(language, 1);
    assert_eq!(verbosity, 0);
}

#[test]
fn scan_accepts_every_tunable() {
    let cli = Cli::try_parse_from([
        "predscan", "scan", "-t", "train.txt", "-s", "list.txt", "-c", "3", "-n", "10", "-j",
        "16", "-o", "/var/log", "-a", "50.0", "-l", "2", "-v", "2",
    ])
    .unwrap();
    let Commands::Scan {
        max_cost,
        threads,
        anomaly_threshold,
        language,
        verbosity,
        ..
    } = cli.command
    else {
        panic!("expected scan command");
    };
    assert_eq!(max_cost, 3);
    assert_eq!(threads, 16);
    assert_eq!(anomaly_threshold, 50.0);
    assert_eq!(language, 2);
    assert_eq!(verbosity, 2);
}

#[test]
fn dump_requires_a_source_file() {
    assert!(Cli::try_parse_from(["predscan", "dump"]).is_err());
    let cli = Cli::try_parse_from(["predscan", "dump", "-f", "a.c"]).unwrap();
    let Commands::Dump {
        file,
        language,
        level,
        contributor,
    } = cli.command
    else {
        panic!("expected dump command");
    };
    assert_eq!(file.to_str(), Some("a.c"));
    assert_eq!(language, 1);
    assert_eq!(level, 3);
    assert_eq!(contributor, 0);
}

#[test]
fn dump_accepts_language_level_and_contributor() {
    let cli = Cli::try_parse_from([
        "predscan", "dump", "-f", "a.v", "-l", "2", "-t", "1", "-g", "4711",
    ])
    .unwrap();
    let Commands::Dump {
        language,
        level,
        contributor,
        ..
    } = cli.command
    else {
        panic!("expected dump command");
    };
    assert_eq!(language, 2);
    assert_eq!(level, 1);
    assert_eq!(contributor, 4711);
}
