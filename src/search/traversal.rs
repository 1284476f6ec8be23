//! Parallel full-traversal search.
//!
//! Scans the trie's flat pattern list and keeps every entry within the edit
//! budget. Workers claim list indices from a shared atomic cursor and append
//! matches to a shared vector behind a writer lock, so the result set is
//! independent of the worker count.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::distance::edit_distance;
use crate::search::NearestExpression;
use crate::trie::Trie;

/// Number of traversal workers for a caller-supplied thread budget.
///
/// The scanner already runs `floor(sqrt(N))` file workers, each of which may
/// run a traversal search; taking the square root again keeps the product of
/// the two nesting levels within the budget. This is policy, shared with the
/// file-scan driver.
pub(crate) fn worker_count(max_threads: usize) -> usize {
    ((max_threads as f64).sqrt().floor() as usize).max(1)
}

pub(crate) fn search(
    trie: &Trie,
    target: &str,
    max_cost: usize,
    max_threads: usize,
) -> Vec<NearestExpression> {
    let cursor = AtomicUsize::new(0);
    let results = RwLock::new(Vec::new());

    let scan_entries = || loop {
        let index = cursor.fetch_add(1, Ordering::Relaxed);
        let Some((path, occurrences)) = trie.paths.get(index) else {
            break;
        };
        let cost = edit_distance(path, target);
        if cost <= max_cost {
            results
                .write()
                .push(NearestExpression::new(path.clone(), cost, *occurrences));
        }
    };

    let workers = worker_count(max_threads);
    if workers <= 1 {
        scan_entries();
    } else {
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| scan_entries());
            }
        });
    }

    results.into_inner()
}
