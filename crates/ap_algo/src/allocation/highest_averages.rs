//! Highest-averages (divisor) allocation shared by Sainte-Laguë, D'Hondt and
//! Huntington-Hill.
//!
//! Contract:
//! - Award `rounds` seats one at a time to the entity with the largest
//!   `weight / divisor`; only the winner's divisor moves.
//! - Exact ties go to the earliest input position (scan keeps the first best).
//! - Sainte-Laguë and D'Hondt divisors are rationals in units of
//!   `1 / DIVISOR_SCALE` and quotients compare by cross-multiplication, so an
//!   exact tie is never decided by float rounding.
//! - Huntington-Hill divisors are irrational. A zero divisor yields
//!   `Priority::Unbounded`, which outranks every finite score and ties with
//!   other unbounded scores. No IEEE infinity/NaN is ever compared.

use core::cmp::Ordering;

/// Divisors passed to `cmp_scaled` are integers in units of `1 / DIVISOR_SCALE`.
pub const DIVISOR_SCALE: u128 = 10_000;

/// Huntington-Hill score of an entity in one round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Priority {
    Finite(f64),
    /// weight / 0: every zero-divisor entity ranks here, ahead of all finite scores.
    Unbounded,
}

impl Priority {
    /// `weight / divisor`, with a zero divisor mapped to `Unbounded`.
    #[inline]
    pub fn of(weight: f64, divisor: f64) -> Self {
        if divisor == 0.0 {
            Priority::Unbounded
        } else {
            Priority::Finite(weight / divisor)
        }
    }

    /// Total order: `Unbounded` > any `Finite`; finite scores by `f64::total_cmp`.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Priority::Unbounded, Priority::Unbounded) => Ordering::Equal,
            (Priority::Unbounded, Priority::Finite(_)) => Ordering::Greater,
            (Priority::Finite(_), Priority::Unbounded) => Ordering::Less,
            (Priority::Finite(a), Priority::Finite(b)) => a.total_cmp(b),
        }
    }

    #[inline]
    pub fn outranks(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Greater
    }
}

/// Compare `v1/d1` with `v2/d2` by cross-multiplication. Divisors are ≥ 1.
#[inline]
pub fn cmp_quotients(v1: u64, d1: u128, v2: u64, d2: u128) -> Ordering {
    let left = u128::from(v1).saturating_mul(d2);
    let right = u128::from(v2).saturating_mul(d1);
    left.cmp(&right)
}

/// Whole-number weight as a count, if it is one.
fn as_count(w: f64) -> Option<u64> {
    (w >= 0.0 && w.fract() == 0.0 && w < u64::MAX as f64).then_some(w as u64)
}

/// Compare `w1/d1` with `w2/d2` for scaled integer divisors.
///
/// Whole-number weights (vote counts) compare exactly. Fractional weights
/// (planner scores) cross-multiply in `f64`.
pub fn cmp_scaled(w1: f64, d1: u128, w2: f64, d2: u128) -> Ordering {
    match (as_count(w1), as_count(w2)) {
        (Some(a), Some(b)) => cmp_quotients(a, d1, b, d2),
        _ => (w1 * d2 as f64).total_cmp(&(w2 * d1 as f64)),
    }
}

/// Run `rounds` divisor rounds.
///
/// `seats` holds the starting seat count per entity (0, or the Huntington-Hill
/// floor) and is updated in place. `rank(i, k, j, m)` orders entity `i` holding
/// `k` seats against entity `j` holding `m` seats.
pub(crate) fn run_rounds<F>(seats: &mut [u32], rounds: u32, rank: F)
where
    F: Fn(usize, u32, usize, u32) -> Ordering,
{
    if seats.is_empty() {
        return;
    }
    for _round in 0..rounds {
        let winner = argmax_first(seats, &rank);
        seats[winner] += 1;
    }
}

/// Index of the highest quotient; the earliest index wins exact ties.
fn argmax_first<F>(seats: &[u32], rank: &F) -> usize
where
    F: Fn(usize, u32, usize, u32) -> Ordering,
{
    let mut best = 0usize;
    for i in 1..seats.len() {
        if rank(i, seats[i], best, seats[best]) == Ordering::Greater {
            best = i;
        }
    }
    best
}
