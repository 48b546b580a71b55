//! Apportionment methods as a closed set of strategy variants.
//!
//! | Method          | First divisor            | Divisor after the k-th seat |
//! |-----------------|--------------------------|-----------------------------|
//! | Sainte-Laguë    | configurable (1.4)       | 2k + 1                      |
//! | D'Hondt         | configurable (1.0)       | k + 1                       |
//! | Huntington-Hill | sqrt(k0·(k0+1))          | sqrt(k·(k+1))               |
//! | FPTP            | n/a (winner takes pool)  | n/a                         |
//!
//! Every variant honours the same contract: given `seats` and an ordered list
//! of `(label, weight)` pairs, return `label -> seats` summing to `seats`
//! (FPTP with no positive weight, and an empty input, yield an empty map).

use std::collections::{BTreeMap, BTreeSet};

use ap_core::variables::MethodKind;
use thiserror::Error;

use super::highest_averages::{self, cmp_scaled, Priority, DIVISOR_SCALE};
use super::fptp;

/// Label → awarded seats.
pub type SeatMap<L> = BTreeMap<L, u32>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocError {
    /// Seat pool arithmetic went below zero (configuration error).
    #[error("negative seat pool: {0}")]
    NegativePool(i64),
    #[error("seat pool does not fit in u32: {0}")]
    PoolOverflow(i64),
    /// Huntington-Hill floor cannot be honoured inside the pool.
    #[error("pool of {pool} seats cannot give {floor} seat(s) to each of {entities} entities")]
    FloorExceedsPool { pool: u32, floor: u32, entities: usize },
    #[error("weight at input position {index} must be finite and >= 0, got {weight}")]
    InvalidWeight { index: usize, weight: f64 },
    #[error("first divisor must be finite and > 0, got {0}")]
    InvalidDivisor(f64),
    #[error("threshold must be finite in [0,100], got {0}")]
    InvalidThreshold(f64),
    #[error("duplicate label at input position {index}")]
    DuplicateLabel { index: usize },
}

/// Convert signed pool arithmetic into a seat count.
pub fn seat_pool(pool: i64) -> Result<u32, AllocError> {
    if pool < 0 {
        return Err(AllocError::NegativePool(pool));
    }
    u32::try_from(pool).map_err(|_| AllocError::PoolOverflow(pool))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Method {
    SainteLague { first_divisor: f64 },
    DHondt { first_divisor: f64 },
    /// `initial_seats` is the floor every surviving entity starts from;
    /// entities below `threshold_pct` of the total weight are dropped first.
    HuntingtonHill { initial_seats: u32, threshold_pct: f64 },
    FirstPastThePost,
}

impl Method {
    pub const SAINTE_LAGUE_FIRST_DIVISOR: f64 = 1.4;
    pub const DHONDT_FIRST_DIVISOR: f64 = 1.0;

    /// Method with the tabled defaults (Huntington-Hill: floor 1, no filter).
    pub fn standard(kind: MethodKind) -> Self {
        match kind {
            MethodKind::SainteLague => Method::SainteLague {
                first_divisor: Self::SAINTE_LAGUE_FIRST_DIVISOR,
            },
            MethodKind::DHondt => Method::DHondt { first_divisor: Self::DHONDT_FIRST_DIVISOR },
            MethodKind::HuntingtonHill => Method::HuntingtonHill {
                initial_seats: 1,
                threshold_pct: 0.0,
            },
            MethodKind::FirstPastThePost => Method::FirstPastThePost,
        }
    }

    /// Override the first divisor (Sainte-Laguë / D'Hondt only; others unchanged).
    pub fn with_first_divisor(self, first_divisor: f64) -> Self {
        match self {
            Method::SainteLague { .. } => Method::SainteLague { first_divisor },
            Method::DHondt { .. } => Method::DHondt { first_divisor },
            other => other,
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Method::SainteLague { .. } => MethodKind::SainteLague,
            Method::DHondt { .. } => MethodKind::DHondt,
            Method::HuntingtonHill { .. } => MethodKind::HuntingtonHill,
            Method::FirstPastThePost => MethodKind::FirstPastThePost,
        }
    }

    /// Plain per-round divisor for an entity holding `k` seats, without any
    /// first-divisor adjustment: `2k+1`, `k+1`, `sqrt(k(k+1))`.
    /// FPTP ranks like D'Hondt.
    pub fn sequence_divisor(&self, k: u32) -> f64 {
        let k = f64::from(k);
        match self {
            Method::SainteLague { .. } => 2.0 * k + 1.0,
            Method::DHondt { .. } | Method::FirstPastThePost => k + 1.0,
            Method::HuntingtonHill { .. } => (k * (k + 1.0)).sqrt(),
        }
    }

    /// Leveling rest-quotient divisor for a party holding `k` direct seats:
    /// `k+1` under D'Hondt, `2k+1` under every other district method.
    pub fn rest_divisor(&self, k: u32) -> u128 {
        match self {
            Method::DHondt { .. } => u128::from(k) + 1,
            _ => 2 * u128::from(k) + 1,
        }
    }

    /// `divisor(k)` in units of `1 / DIVISOR_SCALE`, for exact comparison.
    /// The first divisor is held to four decimals (1.4 → 14000).
    pub fn scaled_divisor(&self, k: u32) -> u128 {
        match self {
            Method::SainteLague { first_divisor } | Method::DHondt { first_divisor } if k == 0 => {
                // Finite and > 0 after `check`.
                ((first_divisor * DIVISOR_SCALE as f64).round() as u128).max(1)
            }
            Method::SainteLague { .. } => (2 * u128::from(k) + 1) * DIVISOR_SCALE,
            Method::DHondt { .. } | Method::FirstPastThePost => (u128::from(k) + 1) * DIVISOR_SCALE,
            Method::HuntingtonHill { .. } => {
                (self.sequence_divisor(k) * DIVISOR_SCALE as f64).round() as u128
            }
        }
    }

    /// Divisor used during allocation: the first divisor applies while k == 0.
    pub fn divisor(&self, k: u32) -> f64 {
        match self {
            Method::SainteLague { first_divisor } | Method::DHondt { first_divisor } if k == 0 => {
                *first_divisor
            }
            _ => self.sequence_divisor(k),
        }
    }

    fn check(&self) -> Result<(), AllocError> {
        match *self {
            Method::SainteLague { first_divisor } | Method::DHondt { first_divisor } => {
                if !first_divisor.is_finite() || first_divisor <= 0.0 {
                    return Err(AllocError::InvalidDivisor(first_divisor));
                }
            }
            Method::HuntingtonHill { threshold_pct, .. } => {
                if !threshold_pct.is_finite() || !(0.0..=100.0).contains(&threshold_pct) {
                    return Err(AllocError::InvalidThreshold(threshold_pct));
                }
            }
            Method::FirstPastThePost => {}
        }
        Ok(())
    }

    /// Allocate `seats` over `entries` (ordered; earlier entries win exact ties).
    pub fn allocate<L: Clone + Ord>(
        &self,
        seats: u32,
        entries: &[(L, f64)],
    ) -> Result<SeatMap<L>, AllocError> {
        self.check()?;
        validate_entries(entries)?;
        if entries.is_empty() {
            return Ok(SeatMap::new());
        }

        match *self {
            Method::FirstPastThePost => Ok(fptp::allocate_fptp(seats, entries)),
            Method::SainteLague { .. } | Method::DHondt { .. } => {
                let mut won = vec![0u32; entries.len()];
                highest_averages::run_rounds(&mut won, seats, |i, k, j, m| {
                    cmp_scaled(
                        entries[i].1,
                        self.scaled_divisor(k),
                        entries[j].1,
                        self.scaled_divisor(m),
                    )
                });
                Ok(zip_labels(entries.iter().map(|(l, _)| l), won))
            }
            Method::HuntingtonHill { initial_seats, threshold_pct } => {
                let kept = filter_by_share(entries, threshold_pct);
                if kept.is_empty() {
                    return Ok(SeatMap::new());
                }
                let floor_total = u64::from(initial_seats) * kept.len() as u64;
                if floor_total > u64::from(seats) {
                    return Err(AllocError::FloorExceedsPool {
                        pool: seats,
                        floor: initial_seats,
                        entities: kept.len(),
                    });
                }
                // floor_total <= seats, so the cast is lossless.
                let rounds = seats - floor_total as u32;
                let mut won = vec![initial_seats; kept.len()];
                highest_averages::run_rounds(&mut won, rounds, |i, k, j, m| {
                    Priority::of(kept[i].1, self.divisor(k))
                        .total_cmp(&Priority::of(kept[j].1, self.divisor(m)))
                });
                Ok(zip_labels(kept.iter().map(|(l, _)| l), won))
            }
        }
    }
}

fn validate_entries<L: Ord>(entries: &[(L, f64)]) -> Result<(), AllocError> {
    let mut seen: BTreeSet<&L> = BTreeSet::new();
    for (index, (label, weight)) in entries.iter().enumerate() {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(AllocError::InvalidWeight { index, weight: *weight });
        }
        if !seen.insert(label) {
            return Err(AllocError::DuplicateLabel { index });
        }
    }
    Ok(())
}

/// Keep entries whose share of the total weight is at least `threshold_pct`.
/// With a zero total nobody can be measured, so nobody is dropped.
fn filter_by_share<L: Clone>(entries: &[(L, f64)], threshold_pct: f64) -> Vec<(L, f64)> {
    let total: f64 = entries.iter().map(|(_, w)| *w).sum();
    entries
        .iter()
        .filter(|(_, w)| total <= 0.0 || *w / total * 100.0 >= threshold_pct)
        .cloned()
        .collect()
}

fn zip_labels<'a, L: Clone + Ord + 'a>(
    labels: impl Iterator<Item = &'a L>,
    won: Vec<u32>,
) -> SeatMap<L> {
    labels.cloned().zip(won).collect()
}
