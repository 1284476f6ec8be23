//! Character trie over compacted predicate patterns.
//!
//! One trie holds the population of patterns observed at a single
//! abstraction level. It is built once from a training corpus by a single
//! writer and is immutable afterwards; every search operation takes `&self`
//! and is safe to call from many reader threads.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::compacter::Compacter;
use crate::error::{Error, Result};
use crate::search::{self, NearestExpression, SearchAlgorithm};
use crate::training::{parse_record, TreeLevel};

/// Occurrence counts per contributor id for one stored pattern.
pub type ContributorCounts = FxHashMap<u64, u64>;

/// Index of the root node in the arena.
const ROOT: u32 = 0;

/// A node of the trie arena.
///
/// Nodes never own their children; edges carry arena indices, so dropping
/// the trie releases every node without recursion.
#[derive(Debug, Default)]
pub(crate) struct TrieNode {
    /// Outgoing edges as (byte label, child index), sorted by label.
    edges: SmallVec<[(u8, u32); 4]>,
    /// Number of insertions whose path passes through or ends at this node.
    pub(crate) occurrences: u64,
    /// Internal nodes can be terminal when one pattern prefixes another.
    pub(crate) terminal: bool,
    /// Contributor counts; populated on terminal nodes only.
    pub(crate) contributors: ContributorCounts,
}

impl TrieNode {
    fn child(&self, label: u8) -> Option<u32> {
        self.edges
            .binary_search_by_key(&label, |&(l, _)| l)
            .ok()
            .map(|i| self.edges[i].1)
    }
}

/// Multiset of compacted patterns with prefix sharing.
///
/// Built from a training corpus with [`Trie::build`]; searched with
/// [`Trie::lookup`] and [`Trie::search_nearest`]. The trie keeps a flat list
/// of every stored pattern so the traversal engine can scan the population
/// in parallel without walking the tree.
#[derive(Debug)]
pub struct Trie {
    compacter: Arc<Compacter>,
    nodes: Vec<TrieNode>,
    /// Every byte that appears on any trie edge.
    pub(crate) alphabet: FxHashSet<u8>,
    /// Flat `(compacted pattern, occurrences)` list over all terminals.
    /// Populated exactly once by [`Trie::finalize`]; ordering unspecified.
    pub(crate) paths: Vec<(String, u64)>,
    /// Deletion variant -> corpus lines whose pattern produces the variant.
    /// Populated during insertion only for the symmetric-delete engine.
    pub(crate) deletion_index: FxHashMap<String, FxHashSet<usize>>,
    /// Corpus line -> compacted pattern inserted from that line.
    pub(crate) line_patterns: FxHashMap<usize, String>,
    algorithm: SearchAlgorithm,
}

impl Trie {
    /// Create an empty trie using the default search engine.
    pub fn new(compacter: Arc<Compacter>) -> Self {
        Self::with_algorithm(compacter, SearchAlgorithm::default())
    }

    /// Create an empty trie that will search with `algorithm`.
    ///
    /// The engine must be chosen before insertion: the symmetric-delete
    /// engine indexes deletion variants while patterns are inserted.
    pub fn with_algorithm(compacter: Arc<Compacter>, algorithm: SearchAlgorithm) -> Self {
        Trie {
            compacter,
            nodes: vec![TrieNode::default()],
            alphabet: FxHashSet::default(),
            paths: Vec::new(),
            deletion_index: FxHashMap::default(),
            line_patterns: FxHashMap::default(),
            algorithm,
        }
    }

    /// Build a trie from the records of `train_path` that carry the marker
    /// for `level`.
    ///
    /// # Errors
    ///
    /// [`Error::FileAccess`] if the corpus cannot be read and
    /// [`Error::MalformedTrainingData`] if no line at `level` is recognized.
    pub fn build(
        compacter: Arc<Compacter>,
        train_path: &Path,
        level: TreeLevel,
    ) -> Result<Self> {
        Self::build_with_algorithm(compacter, train_path, level, SearchAlgorithm::default())
    }

    /// [`Trie::build`] with an explicit search engine.
    pub fn build_with_algorithm(
        compacter: Arc<Compacter>,
        train_path: &Path,
        level: TreeLevel,
        algorithm: SearchAlgorithm,
    ) -> Result<Self> {
        let file = File::open(train_path).map_err(|source| Error::FileAccess {
            path: train_path.to_path_buf(),
            source,
        })?;

        let mut trie = Self::with_algorithm(compacter, algorithm);
        let mut line_no = 1usize;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| Error::FileAccess {
                path: train_path.to_path_buf(),
                source,
            })?;
            if let Some(record) = parse_record(&line, level) {
                trie.insert(record.pattern, line_no, record.contributor_id);
            }
            line_no += 1;
        }

        trie.finalize();
        if trie.paths.is_empty() {
            return Err(Error::MalformedTrainingData {
                path: train_path.to_path_buf(),
            });
        }
        Ok(trie)
    }

    /// Insert one pattern observed on corpus line `line_no`.
    ///
    /// The pattern is compacted first; every node on its path gains an
    /// occurrence, every edge byte joins the alphabet, and the final node
    /// becomes terminal with `contributor_id` credited.
    pub fn insert(&mut self, expression: &str, line_no: usize, contributor_id: u64) {
        let pattern = self.compacter.compact(expression);
        self.insert_compacted(pattern, line_no, contributor_id);
    }

    fn insert_compacted(&mut self, pattern: String, line_no: usize, contributor_id: u64) {
        if self.algorithm == SearchAlgorithm::SymmetricDelete {
            for variant in search::symdelete::deletion_variants(
                &pattern,
                search::symdelete::INDEX_DEPTH,
            )
            .into_keys()
            {
                self.deletion_index
                    .entry(variant)
                    .or_default()
                    .insert(line_no);
            }
            self.line_patterns.insert(line_no, pattern.clone());
        }

        let mut node = ROOT;
        for &label in pattern.as_bytes() {
            self.nodes[node as usize].occurrences += 1;
            let probe = self.nodes[node as usize]
                .edges
                .binary_search_by_key(&label, |&(l, _)| l);
            node = match probe {
                Ok(i) => self.nodes[node as usize].edges[i].1,
                Err(at) => {
                    let child = self.nodes.len() as u32;
                    self.nodes.push(TrieNode::default());
                    self.nodes[node as usize].edges.insert(at, (label, child));
                    child
                }
            };
            self.alphabet.insert(label);
        }
        let leaf = &mut self.nodes[node as usize];
        leaf.occurrences += 1;
        leaf.terminal = true;
        *leaf.contributors.entry(contributor_id).or_insert(0) += 1;
    }

    /// Exact lookup: `Some(occurrences)` if the pattern was inserted,
    /// `None` otherwise. Prefixes of stored patterns do not match unless
    /// they were inserted themselves.
    pub fn lookup(&self, expression: &str) -> Option<u64> {
        let pattern = self.compacter.compact(expression);
        self.lookup_compacted(&pattern)
    }

    pub(crate) fn lookup_compacted(&self, pattern: &str) -> Option<u64> {
        let mut node = ROOT;
        for &label in pattern.as_bytes() {
            node = self.nodes[node as usize].child(label)?;
        }
        let node = &self.nodes[node as usize];
        node.terminal.then_some(node.occurrences)
    }

    /// Visit every terminal node in breadth-first order with its full path,
    /// occurrence count and contributor counts.
    pub fn visit_terminals(
        &self,
        mut callback: impl FnMut(&str, u64, &ContributorCounts),
    ) {
        let mut queue = VecDeque::new();
        queue.push_back((ROOT, String::new()));
        while let Some((index, path)) = queue.pop_front() {
            let node = &self.nodes[index as usize];
            if node.terminal {
                callback(&path, node.occurrences, &node.contributors);
            }
            for &(label, child) in &node.edges {
                let mut child_path = path.clone();
                child_path.push(label as char);
                queue.push_back((child, child_path));
            }
        }
    }

    /// Populate the flat path list from the terminal nodes.
    ///
    /// Called by [`Trie::build`] after the last insertion; call it directly
    /// when assembling a trie by hand. Subsequent calls are no-ops, so the
    /// list is generated exactly once per trie.
    pub fn finalize(&mut self) {
        if !self.paths.is_empty() {
            return;
        }
        let mut paths = Vec::new();
        self.visit_terminals(|path, occurrences, _| {
            paths.push((path.to_string(), occurrences));
        });
        self.paths = paths;
    }

    /// Number of distinct patterns stored.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.terminal).count()
    }

    /// True if no pattern has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the stored patterns within `max_cost` edits of `expression`.
    ///
    /// The target is compacted, handed to the configured engine, and every
    /// result is re-expanded to full form before it is returned. Results are
    /// unordered; rank them with [`crate::rank::rank`].
    ///
    /// `max_threads` bounds the parallelism of the traversal engine, which
    /// takes `floor(sqrt(max_threads))` workers so that nested searches
    /// under a parallel file sweep stay within the overall budget.
    pub fn search_nearest(
        &self,
        expression: &str,
        max_cost: usize,
        max_threads: usize,
    ) -> Result<Vec<NearestExpression>> {
        let target = self.compacter.compact(expression);
        self.search_nearest_from_compacted(&target, max_cost, max_threads)
    }

    /// [`Trie::search_nearest`] over an already-compacted target, for
    /// callers that compacted the expression themselves (the scan pipeline
    /// compacts once for its cache key).
    pub(crate) fn search_nearest_from_compacted(
        &self,
        target: &str,
        max_cost: usize,
        max_threads: usize,
    ) -> Result<Vec<NearestExpression>> {
        let compact_results = match self.algorithm {
            SearchAlgorithm::TrieTraversal => {
                search::traversal::search(self, target, max_cost, max_threads)
            }
            SearchAlgorithm::CandidateGeneration => {
                search::candidates::search(self, target, max_cost)
            }
            SearchAlgorithm::SymmetricDelete => {
                search::symdelete::search(self, target, max_cost)
            }
        };
        compact_results
            .into_iter()
            .map(|nearest| {
                Ok(NearestExpression::new(
                    self.compacter.expand(&nearest.expression)?,
                    nearest.cost,
                    nearest.num_occurrences,
                ))
            })
            .collect()
    }

    /// Render every stored pattern as
    /// `<pattern>,<occurrences>,<contributors>[,(id;count)...]`, optionally
    /// sorted by occurrences descending.
    pub fn dump_patterns(&self, sorted: bool) -> Result<Vec<String>> {
        struct Row {
            expression: String,
            occurrences: u64,
            contributors: Vec<(u64, u64)>,
        }

        let mut rows = Vec::new();
        let mut expand_error = None;
        self.visit_terminals(|path, occurrences, contributors| {
            match self.compacter.expand(path) {
                Ok(expression) => {
                    let mut contributors: Vec<_> =
                        contributors.iter().map(|(&id, &n)| (id, n)).collect();
                    contributors.sort_unstable();
                    rows.push(Row {
                        expression,
                        occurrences,
                        contributors,
                    });
                }
                Err(error) => expand_error = Some(error),
            }
        });
        if let Some(error) = expand_error {
            return Err(error);
        }

        if sorted {
            rows.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut line = format!(
                    "{},{},{}",
                    row.expression,
                    row.occurrences,
                    row.contributors.len()
                );
                for (id, count) in row.contributors {
                    line.push_str(&format!(",({id};{count})"));
                }
                line
            })
            .collect())
    }
}
