//! ALLOCATE stage: direct seats per district.
//!
//! With the hard threshold on, parties whose national share is below the
//! leveling threshold are removed from every district before allocation.
//! District vote totals recorded by the aggregate stage are left untouched.

use std::collections::BTreeMap;

use ap_algo::ConstituencyError;
use ap_core::{ids::PartyId, variables::Params};
use tracing::{debug, info};

use crate::aggregate::{NationalTally, Tally};
use crate::methods::district_method;

/// Parties strictly below the threshold share of national valid votes.
pub fn below_threshold(national: &NationalTally, threshold_pct: f64) -> Vec<PartyId> {
    if national.valid_votes == 0 {
        return Vec::new();
    }
    let valid = national.valid_votes as f64;
    national
        .votes
        .iter()
        .filter(|(_, v)| {
            let share_pct = 100.0 * (*v as f64) / valid;
            share_pct < threshold_pct
        })
        .map(|(p, _)| p.clone())
        .collect()
}

pub fn allocate_direct(mut tally: Tally, params: &Params) -> Result<Tally, ConstituencyError> {
    let method = district_method(params);

    if params.hard_threshold {
        tally.hard_excluded = below_threshold(&tally.national, params.leveling_threshold_pct);
        for state in &mut tally.districts {
            for party in &tally.hard_excluded {
                if state.constituency.contains(party) {
                    state.constituency.remove_party(party)?;
                }
            }
        }
        info!(excluded = tally.hard_excluded.len(), "hard threshold applied");
    }

    let mut national: BTreeMap<PartyId, u32> = BTreeMap::new();
    for state in &mut tally.districts {
        state.direct_seats = state.constituency.calculate(&method)?;
        for (party, seats) in &state.direct_seats {
            *national.entry(party.clone()).or_insert(0) += seats;
        }
        debug!(
            district = %state.constituency.district(),
            pool = state.constituency.direct_pool(),
            seats = ?state.direct_seats,
            "direct seats"
        );
    }
    tally.national_direct = national;

    info!(method = %method.kind(), "direct seats allocated");
    Ok(tally)
}
