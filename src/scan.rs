//! Per-predicate scan pipeline.
//!
//! [`TrainAndScan`] owns one trie per abstraction level, trained from the
//! same corpus, plus the per-level result caches shared by every scanner
//! worker. Scanning a file runs each predicate through
//! abstract -> compact -> cache lookup -> neighbor search -> rank ->
//! classify and writes the report to the caller's log.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tree_sitter::Node;

use crate::abstraction::{node_to_string, Language, SourceTree};
use crate::cache::NearestExpressionsCache;
use crate::compacter::Compacter;
use crate::error::Result;
use crate::rank::{is_potential_anomaly, rank};
use crate::training::TreeLevel;
use crate::trie::Trie;

/// Verbosity of the scan reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Verdicts only; suggestions appear for anomalies.
    #[default]
    Error,
    /// Suggestions for every predicate.
    Info,
    /// Timings, cache statistics and per-file summaries on top.
    Debug,
}

impl LogLevel {
    /// Map the numeric CLI selector onto a level; out-of-range values keep
    /// the default.
    pub fn from_cli(level: i32) -> Self {
        match level {
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }
}

/// Tunables of a scan session.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Edit-distance budget for neighbor search.
    pub max_cost: usize,
    /// Ranked suggestions kept per predicate.
    pub max_suggestions: usize,
    /// Thread budget shared by the file sweep and the per-file search; each
    /// nesting level takes `floor(sqrt(num_threads))` workers.
    pub num_threads: usize,
    /// Percentage threshold of the anomaly verdict.
    pub anomaly_threshold: f32,
    /// Report verbosity.
    pub log_level: LogLevel,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            max_cost: 2,
            max_suggestions: 5,
            num_threads: 1,
            anomaly_threshold: 3.0,
            log_level: LogLevel::Error,
        }
    }
}

#[derive(Debug, Default)]
struct FileSummary {
    total: usize,
    found: usize,
    not_found: usize,
    level_one_hits: usize,
    level_one_misses: usize,
    level_two_hits: usize,
    level_two_misses: usize,
}

impl FileSummary {
    fn record(&mut self, level_one_hit: bool, level_two_hit: bool) {
        self.total += 1;
        if level_one_hit {
            self.level_one_hits += 1;
        } else {
            self.level_one_misses += 1;
        }
        if level_two_hit {
            self.level_two_hits += 1;
        } else {
            self.level_two_misses += 1;
        }
        if level_one_hit || level_two_hit {
            self.found += 1;
        } else {
            self.not_found += 1;
        }
    }
}

/// Trained tries plus the scan pipeline over them.
pub struct TrainAndScan {
    config: ScanConfig,
    compacter: Arc<Compacter>,
    trie_level_one: Trie,
    trie_level_two: Trie,
    cache_level_one: NearestExpressionsCache,
    cache_level_two: NearestExpressionsCache,
}

impl TrainAndScan {
    /// Train both abstraction levels from `train_path`.
    ///
    /// The corpus must contain records at levels ONE and TWO; a level with
    /// zero recognized records rejects the corpus.
    pub fn train(train_path: &Path, config: ScanConfig) -> Result<Self> {
        let compacter = Arc::new(Compacter::new());
        tracing::info!("training: start");

        let started = Instant::now();
        let trie_level_one = Trie::build(Arc::clone(&compacter), train_path, TreeLevel::One)?;
        tracing::info!(elapsed = ?started.elapsed(), "level ONE trie built");

        let started = Instant::now();
        let trie_level_two = Trie::build(Arc::clone(&compacter), train_path, TreeLevel::Two)?;
        tracing::info!(elapsed = ?started.elapsed(), "level TWO trie built");

        tracing::info!("training: complete");
        Ok(TrainAndScan {
            config,
            compacter,
            trie_level_one,
            trie_level_two,
            cache_level_one: NearestExpressionsCache::new(),
            cache_level_two: NearestExpressionsCache::new(),
        })
    }

    /// The session configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan every predicate of `path` at levels ONE and TWO, reporting to
    /// `log`. Parse failures are absorbed with a log line; the scan goes on.
    pub fn scan_file(&self, path: &Path, language: Language, log: &mut dyn Write) -> Result<()> {
        let tree = match SourceTree::parse_file(path, language) {
            Ok(tree) => tree,
            Err(error) => {
                writeln!(log, "Error: {error} ... skipping")?;
                return Ok(());
            }
        };

        let mut summary = FileSummary::default();
        for predicate in tree.predicates() {
            let context = Some((path, &tree));
            let level_one_hit = self.scan_predicate(
                &self.trie_level_one,
                &self.cache_level_one,
                TreeLevel::One,
                predicate,
                language,
                context,
                log,
            )?;
            let level_two_hit = self.scan_predicate(
                &self.trie_level_two,
                &self.cache_level_two,
                TreeLevel::Two,
                predicate,
                language,
                context,
                log,
            )?;
            summary.record(level_one_hit, level_two_hit);
        }

        if self.config.log_level >= LogLevel::Debug {
            writeln!(
                log,
                "SUMMARY {}:Total/Found/Not_found/L1_hit/L1_miss/L2_hit/L2_miss={},{},{},{},{},{},{}",
                path.display(),
                summary.total,
                summary.found,
                summary.not_found,
                summary.level_one_hits,
                summary.level_one_misses,
                summary.level_two_hits,
                summary.level_two_misses,
            )?;
        }
        Ok(())
    }

    /// Scan the predicates of a raw source string at level ONE.
    ///
    /// Unlike [`TrainAndScan::scan_file`], parse errors anywhere in the
    /// input are reported (and absorbed), since the caller asked about this
    /// exact expression.
    pub fn scan_expression(
        &self,
        expression: &str,
        language: Language,
        log: &mut dyn Write,
    ) -> Result<()> {
        let tree = match SourceTree::parse_source(expression, language, true) {
            Ok(tree) => tree,
            Err(error) => {
                writeln!(log, "Error: {error} ... skipping")?;
                return Ok(());
            }
        };
        let predicates = tree.predicates();
        if predicates.is_empty() {
            writeln!(
                log,
                "Error: No control structures (e.g., if statement) found in the input"
            )?;
            return Ok(());
        }
        for predicate in predicates {
            self.scan_predicate(
                &self.trie_level_one,
                &self.cache_level_one,
                TreeLevel::One,
                predicate,
                language,
                None,
                log,
            )?;
        }
        Ok(())
    }

    /// Emit the per-level cache statistics to the diagnostic log.
    pub fn log_cache_stats(&self) {
        self.cache_level_one.log_stats(TreeLevel::One.tag());
        self.cache_level_two.log_stats(TreeLevel::Two.tag());
    }

    /// Returns whether the predicate's exact pattern was found in training.
    #[allow(clippy::too_many_arguments)]
    fn scan_predicate(
        &self,
        trie: &Trie,
        cache: &NearestExpressionsCache,
        level: TreeLevel,
        predicate: Node<'_>,
        language: Language,
        context: Option<(&Path, &SourceTree)>,
        log: &mut dyn Write,
    ) -> Result<bool> {
        let pattern = match node_to_string(predicate, level, language) {
            Ok(pattern) => pattern,
            Err(error) => {
                // Predicate shapes the abstraction rules cannot express are
                // skipped; the scan continues.
                tracing::debug!(%error, "skipping predicate");
                return Ok(false);
            }
        };

        let found = trie.lookup(&pattern).is_some();
        write!(
            log,
            "Level:{} Expression:{} {} in training dataset: ",
            level,
            pattern,
            if found { "found" } else { "not found" }
        )?;
        if let Some((path, tree)) = context {
            let start = predicate.start_position();
            writeln!(
                log,
                "Source file: {}:{}:{}:{}",
                path.display(),
                start.row,
                start.column,
                tree.slice(predicate)
            )?;
        }

        self.report_corrections(trie, cache, &pattern, log)?;
        Ok(found)
    }

    fn report_corrections(
        &self,
        trie: &Trie,
        cache: &NearestExpressionsCache,
        expression: &str,
        log: &mut dyn Write,
    ) -> Result<()> {
        let pattern = self.compacter.compact(expression);

        let results = match cache.lookup(&pattern) {
            Some(results) => results,
            None => {
                let started = Instant::now();
                let mut results = trie.search_nearest_from_compacted(
                    &pattern,
                    self.config.max_cost,
                    self.config.num_threads,
                )?;
                if self.config.log_level >= LogLevel::Debug {
                    writeln!(
                        log,
                        "Autocorrect search took {:.3} secs",
                        started.elapsed().as_secs_f64()
                    )?;
                }
                rank(&mut results, self.config.max_suggestions);
                cache.insert(pattern, results.clone());
                results
            }
        };

        let anomalous = is_potential_anomaly(&results, self.config.anomaly_threshold);
        if anomalous {
            writeln!(log, "Expression is Potential anomaly")?;
        } else {
            writeln!(log, "Expression is Okay")?;
        }
        if anomalous || self.config.log_level >= LogLevel::Info {
            for nearest in &results {
                writeln!(
                    log,
                    "Did you mean:{} with editing cost:{} and occurrences: {}",
                    nearest.expression, nearest.cost, nearest.num_occurrences
                )?;
            }
            writeln!(log)?;
        }
        Ok(())
    }
}
