//! National leveling (compensatory) seat resolution.
//!
//! Contract:
//! - Parties at or above the threshold share of valid votes compete (inclusive
//!   `>=`); with the single-seat rule, any party holding a direct seat competes
//!   too. Non-competing parties keep exactly their direct seats, which are taken
//!   out of the national pool.
//! - The pool is allocated over competing parties' national votes. Every party
//!   whose direct seats meet or exceed its provisional entitlement is flagged as
//!   over-represented; all flagged parties leave together, the pool shrinks by
//!   their direct seats, and the allocation is recomputed.
//! - Each scan either removes at least one party or ends the loop, so at most
//!   `party_count + 1` scans run. Exceeding that bound is reported, never looped.
//!
//! Output invariant (whenever a party competes at the end):
//! Σ entitlement(competing) + Σ direct(non-competing) == national seats.

use std::collections::BTreeMap;

use ap_core::ids::PartyId;
use thiserror::Error;

use crate::allocation::{seat_pool, AllocError, Method, SeatMap};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelingError {
    #[error("over-representation removal did not settle after {scans} scans")]
    NoConvergence { scans: u32 },
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// National view handed to the resolver.
#[derive(Debug, Clone)]
pub struct LevelingInput<'a> {
    pub national_seats: u32,
    /// National votes per party, in table order.
    pub votes: &'a [(PartyId, u64)],
    /// National direct seats per party (absent = 0).
    pub direct_seats: &'a BTreeMap<PartyId, u32>,
    /// Threshold denominator.
    pub valid_votes: u64,
    pub threshold_pct: f64,
    pub single_seat_rule: bool,
    pub method: Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Competing,
    BelowThreshold,
    OverRepresented,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartyStanding {
    pub party: PartyId,
    pub votes: u64,
    pub share_pct: f64,
    pub direct: u32,
    pub status: Standing,
    /// Entitlement for competing parties, direct seats otherwise.
    pub national_seats: u32,
    /// `national_seats − direct`.
    pub leveling_seats: u32,
    /// Additional votes needed to reach the threshold; `None` for a 100% threshold.
    pub votes_to_threshold: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelingOutcome {
    /// One entry per input party, in table order.
    pub standings: Vec<PartyStanding>,
    /// Final entitlements of the competing set (zero entitlements included).
    pub entitlements: SeatMap<PartyId>,
    /// Pool shared by the competing set after the last removal.
    pub pool: u32,
    pub scans: u32,
}

impl LevelingOutcome {
    pub fn standing(&self, party: &PartyId) -> Option<&PartyStanding> {
        self.standings.iter().find(|s| &s.party == party)
    }

    /// Leveling seats still to be placed for `party` (0 unless competing).
    pub fn leveling_seats(&self, party: &PartyId) -> u32 {
        self.standing(party).map_or(0, |s| s.leveling_seats)
    }

    /// Σ national seats over all parties.
    pub fn national_total(&self) -> u64 {
        self.standings.iter().map(|s| u64::from(s.national_seats)).sum()
    }
}

/// `ceil((t·V − v) / (1 − t))` clamped at zero, `t` as a fraction.
/// Evaluated in percent units so an exact-threshold share yields 0.
pub fn votes_to_threshold(votes: u64, valid_votes: u64, threshold_pct: f64) -> Option<u64> {
    if !(0.0..100.0).contains(&threshold_pct) {
        return None;
    }
    let needed = ((threshold_pct * valid_votes as f64 - 100.0 * votes as f64)
        / (100.0 - threshold_pct))
        .ceil();
    Some(if needed > 0.0 { needed as u64 } else { 0 })
}

fn share_pct(votes: u64, valid_votes: u64) -> f64 {
    if valid_votes == 0 {
        0.0
    } else {
        100.0 * votes as f64 / valid_votes as f64
    }
}

pub fn resolve_leveling(input: &LevelingInput<'_>) -> Result<LevelingOutcome, LevelingError> {
    let direct_of = |p: &PartyId| input.direct_seats.get(p).copied().unwrap_or(0);

    let mut status: Vec<Standing> = Vec::with_capacity(input.votes.len());
    let mut pool = i64::from(input.national_seats);
    for (party, votes) in input.votes {
        let direct = direct_of(party);
        let competes = share_pct(*votes, input.valid_votes) >= input.threshold_pct
            || (input.single_seat_rule && direct >= 1);
        if competes {
            status.push(Standing::Competing);
        } else {
            status.push(Standing::BelowThreshold);
            pool -= i64::from(direct);
        }
    }

    let mut provisional = allocate_competing(input, &status, pool)?;
    let bound = input.votes.len() as u32 + 1;
    let mut scans = 0u32;
    loop {
        if scans == bound {
            return Err(LevelingError::NoConvergence { scans });
        }
        scans += 1;

        let mut flagged = false;
        for (ix, (party, _)) in input.votes.iter().enumerate() {
            if status[ix] != Standing::Competing {
                continue;
            }
            let direct = direct_of(party);
            if direct >= provisional.get(party).copied().unwrap_or(0) {
                status[ix] = Standing::OverRepresented;
                pool -= i64::from(direct);
                flagged = true;
            }
        }
        if !flagged {
            break;
        }
        provisional = allocate_competing(input, &status, pool)?;
    }

    let standings = input
        .votes
        .iter()
        .zip(&status)
        .map(|((party, votes), &status)| {
            let direct = direct_of(party);
            let national_seats = match status {
                Standing::Competing => provisional.get(party).copied().unwrap_or(0),
                _ => direct,
            };
            PartyStanding {
                party: party.clone(),
                votes: *votes,
                share_pct: share_pct(*votes, input.valid_votes),
                direct,
                status,
                national_seats,
                leveling_seats: national_seats.saturating_sub(direct),
                votes_to_threshold: votes_to_threshold(
                    *votes,
                    input.valid_votes,
                    input.threshold_pct,
                ),
            }
        })
        .collect();

    Ok(LevelingOutcome { standings, entitlements: provisional, pool: seat_pool(pool)?, scans })
}

fn allocate_competing(
    input: &LevelingInput<'_>,
    status: &[Standing],
    pool: i64,
) -> Result<SeatMap<PartyId>, LevelingError> {
    let seats = seat_pool(pool)?;
    let entries: Vec<(PartyId, f64)> = input
        .votes
        .iter()
        .zip(status)
        .filter(|(_, s)| **s == Standing::Competing)
        .map(|((p, v), _)| (p.clone(), *v as f64))
        .collect();
    Ok(input.method.allocate(seats, &entries)?)
}
