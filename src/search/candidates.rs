//! Norvig-style candidate generation.
//!
//! Builds the closed set of strings reachable from the target by at most
//! `max_cost` single-character edits over the trie's alphabet, then keeps
//! the candidates that exist in the trie. Runtime depends on the target
//! length and alphabet size, not on the trie population.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::search::NearestExpression;
use crate::trie::Trie;

pub(crate) fn search(trie: &Trie, target: &str, max_cost: usize) -> Vec<NearestExpression> {
    generate_candidates(target, &trie.alphabet, max_cost)
        .into_iter()
        .filter_map(|(expression, cost)| {
            trie.lookup_compacted(&expression)
                .map(|occurrences| NearestExpression::new(expression, cost, occurrences))
        })
        .collect()
}

/// All strings within `max_cost` edits of `target`, mapped to the wave at
/// which they were first produced. Wave `k` extends every wave-`(k-1)`
/// member by one insert, delete or substitute; on collision the lower cost
/// wins because waves are generated in ascending order.
fn generate_candidates(
    target: &str,
    alphabet: &FxHashSet<u8>,
    max_cost: usize,
) -> FxHashMap<String, usize> {
    let mut candidates = FxHashMap::default();
    candidates.insert(target.to_string(), 0);

    for cost in 1..=max_cost {
        let previous_wave: Vec<String> = candidates
            .iter()
            .filter(|&(_, &c)| c == cost - 1)
            .map(|(expression, _)| expression.clone())
            .collect();
        for expression in previous_wave {
            for edit in single_edits(&expression, alphabet) {
                candidates.entry(edit).or_insert(cost);
            }
        }
    }

    candidates
}

/// Every string one edit away from `expression`. Patterns are ASCII, so
/// positions are byte offsets.
fn single_edits(expression: &str, alphabet: &FxHashSet<u8>) -> Vec<String> {
    let mut edits = Vec::new();
    for i in 0..expression.len() {
        let (head, tail) = expression.split_at(i);
        let rest = &tail[1..];
        for &c in alphabet {
            let c = c as char;
            edits.push(format!("{head}{c}{tail}"));
            edits.push(format!("{head}{c}{rest}"));
        }
        edits.push(format!("{head}{rest}"));
    }
    for &c in alphabet {
        edits.push(format!("{expression}{}", c as char));
    }
    edits
}
