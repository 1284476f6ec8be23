//! Inter-query cache of ranked search results.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::search::NearestExpression;

/// Cache of ranked neighbor lists keyed by compacted pattern.
///
/// Source files repeat predicate shapes constantly, and a nearest-neighbor
/// search is many orders of magnitude slower than a map probe. One cache is
/// created per abstraction level (patterns from different levels never
/// collide meaningfully) and shared by all scanner workers for the duration
/// of the scan. Entries are never evicted.
#[derive(Debug, Default)]
pub struct NearestExpressionsCache {
    entries: RwLock<FxHashMap<String, Vec<NearestExpression>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl NearestExpressionsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached neighbor list for `pattern`, if any.
    /// Readers take the shared side of the lock and may run concurrently.
    pub fn lookup(&self, pattern: &str) -> Option<Vec<NearestExpression>> {
        let entries = self.entries.read();
        match entries.get(pattern) {
            Some(results) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(results.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Record the ranked neighbor list for `pattern`, replacing any
    /// previous entry.
    pub fn insert(&self, pattern: String, results: Vec<NearestExpression>) {
        self.entries.write().insert(pattern, results);
    }

    /// Lookup counters as `(hits, misses)`.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Emit the hit/miss counters to the diagnostic log.
    pub fn log_stats(&self, level_tag: &str) {
        let (hits, misses) = self.stats();
        tracing::debug!(level = level_tag, hits, misses, "expression cache statistics");
    }
}
