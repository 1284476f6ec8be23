//! # predscan
//!
//! Detects likely-anomalous control-flow predicates by pattern mining: the
//! abstracted shape of a candidate predicate is compared against a
//! population of shapes harvested from a large training corpus, and the
//! candidate is flagged when its exact shape is rare relative to every near
//! neighbor within a bounded edit distance.
//!
//! The pipeline per predicate is abstract -> compact -> cached
//! nearest-neighbor search over a trie -> rank -> classify:
//!
//! - [`abstraction`] turns condition subtrees into canonical strings at a
//!   chosen [`training::TreeLevel`];
//! - [`compacter`] shortens those strings into a dense digit alphabet;
//! - [`trie`] stores the compacted corpus population with occurrence
//!   counts and offers three [`search`] engines over it;
//! - [`rank`] orders neighbors and renders the anomaly verdict;
//! - [`scan`] drives the whole pipeline and writes the reports.
//!
//! ## Example
//!
//! ```rust,no_run
//! use predscan::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> predscan::Result<()> {
//! let session = TrainAndScan::train(Path::new("training.txt"), ScanConfig::default())?;
//! let mut report = Vec::new();
//! session.scan_file(Path::new("suspect.c"), Language::C, &mut report)?;
//! print!("{}", String::from_utf8_lossy(&report));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abstraction;
pub mod cache;
pub mod cli;
pub mod compacter;
pub mod distance;
pub mod error;
pub mod rank;
pub mod scan;
pub mod search;
pub mod training;
pub mod trie;

pub use error::{Error, Result};

/// Common imports for convenient usage.
pub mod prelude {
    pub use crate::abstraction::Language;
    pub use crate::compacter::Compacter;
    pub use crate::scan::{LogLevel, ScanConfig, TrainAndScan};
    pub use crate::search::{NearestExpression, SearchAlgorithm};
    pub use crate::training::TreeLevel;
    pub use crate::trie::Trie;
}
