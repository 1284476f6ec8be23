//! Symmetric-delete lookup.
//!
//! Instead of enumerating inserts and substitutes, both sides of the match
//! are reduced by deletions alone: at build time every stored pattern is
//! indexed under each string reachable from it by up to
//! [`INDEX_DEPTH`] deletions, and at query time the same generator runs on
//! the target. A shared variant means the pattern and the target meet in
//! the middle. Far cheaper than candidate generation, at the price of
//! approximate costs: a hit is reported at the target-side deletion count,
//! not the true Levenshtein distance.
//!
//! The build-time and query-time variant generators must be the same
//! function, otherwise indexed variants and probed variants drift apart.

use rustc_hash::FxHashMap;

use crate::search::NearestExpression;
use crate::trie::Trie;

/// Deletion depth indexed at build time. Matches the default search budget;
/// queries with a larger `max_cost` fall back to whatever the index holds.
pub(crate) const INDEX_DEPTH: usize = 2;

/// All strings reachable from `target` by at most `max_cost` single
/// character deletions, mapped to the deletion count at which each was
/// first produced. Wave `k` deletes one character at every position of
/// every wave-`(k-1)` member.
pub(crate) fn deletion_variants(target: &str, max_cost: usize) -> FxHashMap<String, usize> {
    let mut variants = FxHashMap::default();
    variants.insert(target.to_string(), 0);

    for cost in 1..=max_cost {
        let previous_wave: Vec<String> = variants
            .iter()
            .filter(|&(_, &c)| c == cost - 1)
            .map(|(variant, _)| variant.clone())
            .collect();
        for variant in previous_wave {
            for i in 0..variant.len() {
                let mut deleted = String::with_capacity(variant.len() - 1);
                deleted.push_str(&variant[..i]);
                deleted.push_str(&variant[i + 1..]);
                variants.entry(deleted).or_insert(cost);
            }
        }
    }

    variants
}

pub(crate) fn search(trie: &Trie, target: &str, max_cost: usize) -> Vec<NearestExpression> {
    // Pattern -> lowest target-side deletion cost over all shared variants.
    let mut best: FxHashMap<&str, usize> = FxHashMap::default();

    for (variant, cost) in deletion_variants(target, max_cost) {
        let Some(lines) = trie.deletion_index.get(&variant) else {
            continue;
        };
        for line in lines {
            if let Some(pattern) = trie.line_patterns.get(line) {
                best.entry(pattern.as_str())
                    .and_modify(|c| *c = (*c).min(cost))
                    .or_insert(cost);
            }
        }
    }

    best.into_iter()
        .map(|(pattern, cost)| {
            let occurrences = trie.lookup_compacted(pattern).unwrap_or(0);
            NearestExpression::new(pattern, cost, occurrences)
        })
        .collect()
}
