//! National seat-to-district distribution.
//!
//! Each district competes with a score `area × area_multiplier + population`.
//! Two schemes:
//! - `Proportional(method)`: one divisor allocation of the whole national total.
//! - `GuaranteedMinimum { initial_seats, at_large }`: Huntington-Hill over
//!   `total − at_large·n` seats (floor `initial_seats`, no filter), then every
//!   district gets `at_large` flat seats on top.
//!
//! The resulting plan must sum to the national total exactly.

use std::collections::BTreeSet;

use ap_core::ids::DistrictId;
use thiserror::Error;

use crate::allocation::{seat_pool, AllocError, Method};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("district plan sums to {actual} seats, expected {expected}")]
    TotalMismatch { expected: u32, actual: u64 },
    #[error("district {district}: {field} must be finite and >= 0, got {value}")]
    InvalidProfile { district: DistrictId, field: &'static str, value: f64 },
    #[error("district {0} listed more than once")]
    DuplicateDistrict(DistrictId),
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Reference data for one district.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictProfile {
    pub id: DistrictId,
    pub population: f64,
    pub area: f64,
}

impl DistrictProfile {
    #[inline]
    pub fn score(&self, area_multiplier: f64) -> f64 {
        self.area * area_multiplier + self.population
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanScheme {
    Proportional(Method),
    GuaranteedMinimum { initial_seats: u32, at_large: u32 },
}

/// Planned seats per district, in reference-table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatPlan {
    total: u32,
    seats: Vec<(DistrictId, u32)>,
}

impl SeatPlan {
    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn seats_of(&self, district: &DistrictId) -> Option<u32> {
        self.seats.iter().find(|(d, _)| d == district).map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DistrictId, u32)> {
        self.seats.iter().map(|(d, s)| (d, *s))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

/// Distribute `total` seats over `profiles`.
pub fn plan_district_seats(
    total: u32,
    profiles: &[DistrictProfile],
    area_multiplier: f64,
    scheme: &PlanScheme,
) -> Result<SeatPlan, PlanError> {
    check_profiles(profiles)?;

    let scores: Vec<(DistrictId, f64)> =
        profiles.iter().map(|p| (p.id.clone(), p.score(area_multiplier))).collect();

    let (awarded, flat) = match *scheme {
        PlanScheme::Proportional(method) => (method.allocate(total, &scores)?, 0),
        PlanScheme::GuaranteedMinimum { initial_seats, at_large } => {
            let reserved = i64::from(at_large) * profiles.len() as i64;
            let pool = seat_pool(i64::from(total) - reserved)?;
            let hh = Method::HuntingtonHill { initial_seats, threshold_pct: 0.0 };
            (hh.allocate(pool, &scores)?, at_large)
        }
    };

    let seats: Vec<(DistrictId, u32)> = profiles
        .iter()
        .map(|p| (p.id.clone(), awarded.get(&p.id).copied().unwrap_or(0) + flat))
        .collect();

    let actual: u64 = seats.iter().map(|(_, s)| u64::from(*s)).sum();
    if actual != u64::from(total) {
        return Err(PlanError::TotalMismatch { expected: total, actual });
    }
    Ok(SeatPlan { total, seats })
}

fn check_profiles(profiles: &[DistrictProfile]) -> Result<(), PlanError> {
    let mut seen = BTreeSet::new();
    for p in profiles {
        for (field, value) in [("population", p.population), ("area", p.area)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PlanError::InvalidProfile { district: p.id.clone(), field, value });
            }
        }
        if !seen.insert(&p.id) {
            return Err(PlanError::DuplicateDistrict(p.id.clone()));
        }
    }
    Ok(())
}
