//! End-to-end scan: harvest patterns from C sources, train, scan, and read
//! the reports back from the log.

use std::io::Write;
use std::path::Path;

use tempfile::{NamedTempFile, TempDir};

use predscan::abstraction::{node_to_string, Language, SourceTree};
use predscan::scan::{LogLevel, ScanConfig, TrainAndScan};
use predscan::training::TreeLevel;
use predscan::Error;

/// Render the predicates of `source` as corpus records at both levels,
/// repeated `count` times each.
fn records_for(source: &str, count: usize) -> String {
    let tree = SourceTree::parse_source(source, Language::C, false).unwrap();
    let predicates = tree.predicates();
    assert!(!predicates.is_empty(), "no predicates in {source}");

    let mut records = String::new();
    for predicate in predicates {
        let one = node_to_string(predicate, TreeLevel::One, Language::C).unwrap();
        let two = node_to_string(predicate, TreeLevel::Two, Language::C).unwrap();
        for _ in 0..count {
            records.push_str(&format!("//{}\n", tree.slice(predicate)));
            records.push_str(&format!("0,AST_expression_ONE:{one}\n"));
            records.push_str(&format!("0,AST_expression_TWO:{two}\n"));
        }
    }
    records
}

/// Corpus where the equality shape is common and the assignment shape rare.
fn training_file() -> NamedTempFile {
    let mut corpus = String::new();
    corpus.push_str(&records_for(
        "int main() { if (x == y) { return 1; } return 0; }",
        4,
    ));
    corpus.push_str(&records_for(
        "int main() { if (x = y) { return 1; } return 0; }",
        1,
    ));

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(corpus.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn source_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn scan_to_string(session: &TrainAndScan, path: &Path) -> String {
    let mut log = Vec::new();
    session.scan_file(path, Language::C, &mut log).unwrap();
    String::from_utf8(log).unwrap()
}

#[test]
fn rare_assignment_is_reported_as_anomaly() {
    let train = training_file();
    let config = ScanConfig {
        anomaly_threshold: 50.0,
        ..ScanConfig::default()
    };
    let session = TrainAndScan::train(train.path(), config).unwrap();

    let dir = TempDir::new().unwrap();
    let suspect = source_file(
        &dir,
        "suspect.c",
        "int f() { if (u = v) { return 1; } return 0; }",
    );
    let report = scan_to_string(&session, &suspect);

    assert!(report.contains("found in training dataset"), "{report}");
    assert!(report.contains("Expression is Potential anomaly"), "{report}");
    assert!(report.contains("Did you mean:"), "{report}");
    assert!(report.contains("with editing cost:1"), "{report}");
}

#[test]
fn common_equality_is_okay() {
    let train = training_file();
    let config = ScanConfig {
        anomaly_threshold: 50.0,
        ..ScanConfig::default()
    };
    let session = TrainAndScan::train(train.path(), config).unwrap();

    let dir = TempDir::new().unwrap();
    let fine = source_file(
        &dir,
        "fine.c",
        "int f() { if (p == q) { return 1; } return 0; }",
    );
    let report = scan_to_string(&session, &fine);

    assert!(report.contains("Expression is Okay"), "{report}");
    assert!(!report.contains("Potential anomaly"), "{report}");
    // At the default verbosity suggestions are only shown for anomalies.
    assert!(!report.contains("Did you mean:"), "{report}");
}

#[test]
fn info_verbosity_prints_suggestions_for_okay_predicates() {
    let train = training_file();
    let config = ScanConfig {
        anomaly_threshold: 50.0,
        log_level: LogLevel::Info,
        ..ScanConfig::default()
    };
    let session = TrainAndScan::train(train.path(), config).unwrap();

    let dir = TempDir::new().unwrap();
    let fine = source_file(
        &dir,
        "fine.c",
        "int f() { if (p == q) { return 1; } return 0; }",
    );
    let report = scan_to_string(&session, &fine);
    assert!(report.contains("Expression is Okay"), "{report}");
    assert!(report.contains("Did you mean:"), "{report}");
}

#[test]
fn unknown_shapes_are_not_found_but_scanned() {
    let train = training_file();
    let session = TrainAndScan::train(train.path(), ScanConfig::default()).unwrap();

    let dir = TempDir::new().unwrap();
    let novel = source_file(
        &dir,
        "novel.c",
        "int f() { if (a && b && c && d) { return 1; } return 0; }",
    );
    let report = scan_to_string(&session, &novel);
    assert!(report.contains("not found in training dataset"), "{report}");
}

#[test]
fn debug_verbosity_emits_per_file_summary() {
    let train = training_file();
    let config = ScanConfig {
        log_level: LogLevel::Debug,
        ..ScanConfig::default()
    };
    let session = TrainAndScan::train(train.path(), config).unwrap();

    let dir = TempDir::new().unwrap();
    let fine = source_file(
        &dir,
        "fine.c",
        "int f() { if (p == q) { return 1; } return 0; }",
    );
    let report = scan_to_string(&session, &fine);
    assert!(report.contains("SUMMARY"), "{report}");
    assert!(
        report.contains("Total/Found/Not_found/L1_hit/L1_miss/L2_hit/L2_miss=1,1,0,1,0,1,0"),
        "{report}"
    );
}

#[test]
fn unreadable_source_file_is_absorbed_with_a_log_line() {
    let train = training_file();
    let session = TrainAndScan::train(train.path(), ScanConfig::default()).unwrap();

    let mut log = Vec::new();
    session
        .scan_file(Path::new("/nonexistent/missing.c"), Language::C, &mut log)
        .unwrap();
    let report = String::from_utf8(log).unwrap();
    assert!(report.contains("skipping"), "{report}");
}

#[test]
fn scan_expression_reports_at_level_one() {
    let train = training_file();
    let session = TrainAndScan::train(train.path(), ScanConfig::default()).unwrap();

    let mut log = Vec::new();
    session
        .scan_expression(
            "int f() { if (p == q) { return 1; } return 0; }",
            Language::C,
            &mut log,
        )
        .unwrap();
    let report = String::from_utf8(log).unwrap();
    assert!(report.contains("Level:ONE"), "{report}");
    assert!(!report.contains("Level:TWO"), "{report}");
}

#[test]
fn expression_without_predicates_is_an_error_line() {
    let train = training_file();
    let session = TrainAndScan::train(train.path(), ScanConfig::default()).unwrap();

    let mut log = Vec::new();
    session
        .scan_expression("int f() { return 0; }", Language::C, &mut log)
        .unwrap();
    let report = String::from_utf8(log).unwrap();
    assert!(report.contains("No control structures"), "{report}");
}

#[test]
fn training_rejects_corpus_without_recognized_records() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"//just a comment\n//another comment\n")
        .unwrap();
    file.flush().unwrap();

    assert!(matches!(
        TrainAndScan::train(file.path(), ScanConfig::default()),
        Err(Error::MalformedTrainingData { .. })
    ));
}

#[test]
fn training_requires_both_levels() {
    // Level ONE records only: the level TWO trie has nothing to train on.
    let source = "int main() { if (x == y) { return 1; } return 0; }";
    let tree = SourceTree::parse_source(source, Language::C, false).unwrap();
    let predicate = tree.predicates()[0];
    let one = node_to_string(predicate, TreeLevel::One, Language::C).unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "0,AST_expression_ONE:{one}").unwrap();
    file.flush().unwrap();

    assert!(matches!(
        TrainAndScan::train(file.path(), ScanConfig::default()),
        Err(Error::MalformedTrainingData { .. })
    ));
}
