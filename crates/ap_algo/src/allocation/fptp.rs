//! First-past-the-post (winner-take-all) allocation.
//!
//! Contract:
//! - The entity with the largest weight takes the whole pool.
//! - Ties for the top weight go to the first occurrence in input order.
//! - No positive weight at all means "no winner": the result is empty rather
//!   than an error.

use std::collections::BTreeMap;

/// Pick the winner index, or `None` when nobody has a positive weight.
pub fn winner_index(weights: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &w) in weights.iter().enumerate() {
        match best {
            None => best = Some((i, w)),
            Some((_, bw)) if w > bw => best = Some((i, w)),
            _ => {}
        }
    }
    best.filter(|&(_, w)| w > 0.0).map(|(i, _)| i)
}

/// Winner takes `seats`; every other entry is kept at zero.
pub(crate) fn allocate_fptp<L: Clone + Ord>(seats: u32, entries: &[(L, f64)]) -> BTreeMap<L, u32> {
    let weights: Vec<f64> = entries.iter().map(|(_, w)| *w).collect();
    match winner_index(&weights) {
        None => BTreeMap::new(),
        Some(win) => entries
            .iter()
            .enumerate()
            .map(|(i, (label, _))| (label.clone(), if i == win { seats } else { 0 }))
            .collect(),
    }
}
