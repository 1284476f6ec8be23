//! Ranking of search results and the anomaly verdict.

use crate::search::NearestExpression;

/// Rank `results` in place and truncate to `max_results`.
///
/// Lower cost is better; among equal costs, more occurrences are better.
/// The sort is stable, so ranking an already-ranked list leaves it
/// unchanged.
pub fn rank(results: &mut Vec<NearestExpression>, max_results: usize) {
    results.sort_by(|a, b| {
        a.cost
            .cmp(&b.cost)
            .then(b.num_occurrences.cmp(&a.num_occurrences))
    });
    results.truncate(max_results);
}

/// Is the exact match in `results` a potential anomaly at `threshold`?
///
/// The base entry is the unique cost-0 result (the candidate itself as seen
/// in training). The candidate is anomalous when, for every neighbor at a
/// positive cost, the base occurrences are at most `threshold` percent of
/// the neighbor's: a shape that was seen a handful of times surrounded by
/// heavily-used variants looks like a typo of those variants.
///
/// Returns `false` when there is no cost-0 entry, or no entry with a
/// positive cost, or any neighbor for which
/// `100 * base.occurrences / neighbor.occurrences` exceeds `threshold`.
pub fn is_potential_anomaly(results: &[NearestExpression], threshold: f32) -> bool {
    let Some(base) = results.iter().find(|e| e.cost == 0) else {
        return false;
    };
    if !results.iter().any(|e| e.cost > 0) {
        return false;
    }

    for neighbor in results.iter().filter(|e| e.cost > 0) {
        let occurrences_percent =
            (base.num_occurrences * 100) as f32 / neighbor.num_occurrences as f32;
        if occurrences_percent > threshold {
            return false;
        }
    }
    true
}
