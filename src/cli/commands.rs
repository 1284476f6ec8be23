//! CLI command implementations.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context, Result};

use crate::abstraction::{node_to_string, Language, SourceTree};
use crate::scan::{LogLevel, ScanConfig, TrainAndScan};
use crate::training::TreeLevel;

use super::args::Commands;

/// Execute a CLI command.
pub fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Dump {
            file,
            language,
            level: _,
            contributor,
        } => cmd_dump(&file, language, contributor),
        Commands::Scan {
            train,
            eval_file,
            source_list,
            max_cost,
            max_suggestions,
            threads,
            log_dir,
            anomaly_threshold,
            language,
            verbosity,
        } => cmd_scan(
            &train,
            eval_file,
            source_list,
            ScanConfig {
                max_cost,
                max_suggestions,
                num_threads: threads.max(1),
                anomaly_threshold,
                log_level: LogLevel::from_cli(verbosity),
            },
            language,
            &log_dir,
        ),
    }
}

/// Dump every predicate of a source file as training records: the original
/// source as a `//` comment, then one record per abstraction level.
fn cmd_dump(file: &Path, language: i32, contributor: u64) -> Result<()> {
    let language = Language::from_cli(language)?;
    let tree = SourceTree::parse_file(file, language)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for predicate in tree.predicates() {
        let level_one = node_to_string(predicate, TreeLevel::One, language);
        let level_two = node_to_string(predicate, TreeLevel::Two, language);
        let (one, two) = match (level_one, level_two) {
            (Ok(one), Ok(two)) => (one, two),
            // Predicates the abstraction rules cannot express are skipped.
            _ => continue,
        };
        writeln!(out, "//{}", tree.slice(predicate))?;
        writeln!(
            out,
            "{},AST_expression_{}:{}",
            contributor,
            TreeLevel::One.tag(),
            one
        )?;
        writeln!(
            out,
            "{},AST_expression_{}:{}",
            contributor,
            TreeLevel::Two.tag(),
            two
        )?;
    }
    Ok(())
}

fn cmd_scan(
    train: &Path,
    eval_file: Option<PathBuf>,
    source_list: Option<PathBuf>,
    config: ScanConfig,
    language: i32,
    log_dir: &Path,
) -> Result<()> {
    let language = Language::from_cli(language)?;
    let eval_files = collect_eval_files(eval_file, source_list)?;
    if eval_files.is_empty() {
        bail!("no files to scan");
    }

    let session = TrainAndScan::train(train, config)?;

    println!("Storing logs in {}", log_dir.display());
    run_scan_threads(&session, &eval_files, language, log_dir)?;
    session.log_cache_stats();
    Ok(())
}

fn collect_eval_files(
    eval_file: Option<PathBuf>,
    source_list: Option<PathBuf>,
) -> Result<Vec<PathBuf>> {
    if let Some(file) = eval_file {
        return Ok(vec![file]);
    }
    let Some(list) = source_list else {
        bail!("one of --eval-file and --source-list is required");
    };
    let content = fs::read_to_string(&list)
        .with_context(|| format!("failed to read {}", list.display()))?;
    Ok(content
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Greedy multi-threaded sweep: each worker claims the next unscanned file
/// from a shared cursor and writes its reports to its own log file.
///
/// Worker count is `floor(sqrt(num_threads))` because every scan may itself
/// run a parallel neighbor search with the same factor; the product of the
/// two levels stays within the configured budget.
fn run_scan_threads(
    session: &TrainAndScan,
    files: &[PathBuf],
    language: Language,
    log_dir: &Path,
) -> Result<()> {
    let worker_count = ((session.config().num_threads as f64).sqrt().floor() as usize).max(1);
    let tenth = if files.len() < 10 {
        files.len()
    } else {
        files.len() / 10
    };
    let cursor = AtomicUsize::new(0);

    std::thread::scope(|scope| -> Result<()> {
        let mut workers = Vec::new();
        for worker in 0..worker_count {
            let log_path = log_dir.join(format!("thread_{worker}.log"));
            let cursor = &cursor;
            workers.push(scope.spawn(move || -> Result<()> {
                let file = File::create(&log_path)
                    .with_context(|| format!("failed to create {}", log_path.display()))?;
                let mut log = BufWriter::new(file);
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = files.get(index) else {
                        break;
                    };
                    writeln!(log, "[TID={worker}] Scanning File: {}", path.display())?;
                    if let Err(error) = session.scan_file(path, language, &mut log) {
                        writeln!(log, "Error: {error} ... skipping")?;
                    }
                    let scanned = index + 1;
                    if tenth > 0 && scanned % tenth == 0 {
                        println!(
                            "Scan progress:{scanned}/{} ... in progress",
                            files.len()
                        );
                    }
                }
                log.flush()?;
                Ok(())
            }));
        }
        for handle in workers {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => bail!("scanner thread panicked"),
            }
        }
        Ok(())
    })
}
