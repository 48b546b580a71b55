//! BUILD stage: assemble the immutable `ElectionOutcome` and check the
//! national seat balance.

use std::collections::BTreeMap;

use ap_algo::{LevelingOutcome, SeatPlan, Standing};
use ap_core::{ids::PartyId, variables::Params};

use crate::aggregate::Tally;
use crate::place::Placed;
use crate::{DistrictOutcome, ElectionOutcome, PipelineError};

pub fn build(
    plan: SeatPlan,
    tally: Tally,
    leveling: LevelingOutcome,
    placed: Placed,
    params: &Params,
) -> Result<ElectionOutcome, PipelineError> {
    let any_competing = leveling.standings.iter().any(|s| s.status == Standing::Competing);
    if any_competing {
        let actual = leveling.national_total();
        if actual != u64::from(params.total_seats) {
            return Err(PipelineError::SeatTotalMismatch { expected: params.total_seats, actual });
        }
    }

    let Placed { outcome: placement, ledgers } = placed;
    let mut national_final: BTreeMap<PartyId, u32> = BTreeMap::new();
    let districts: Vec<DistrictOutcome> = tally
        .districts
        .into_iter()
        .zip(ledgers)
        .map(|(state, ledger)| {
            for (party, seats) in &ledger.seats {
                *national_final.entry(party.clone()).or_insert(0) += seats;
            }
            let district = state.constituency.district().clone();
            let eligible = state.eligible_voters.filter(|&e| e > 0);
            let pct_of_eligible = |n: u64| eligible.map(|e| n as f64 * 100.0 / e as f64);
            DistrictOutcome {
                leveling_award: placement.awards.get(&district).cloned(),
                votes_per_seat: (state.planned_seats > 0)
                    .then(|| state.votes_cast as f64 / f64::from(state.planned_seats)),
                participation_pct: pct_of_eligible(state.votes_cast),
                blank_pct_of_eligible: pct_of_eligible(state.blank_votes),
                planned_seats: state.planned_seats,
                direct_pool: state.constituency.direct_pool(),
                leveling_seats: state.constituency.leveling_seats(),
                valid_votes: state.valid_votes,
                blank_votes: state.blank_votes,
                votes_cast: state.votes_cast,
                eligible_voters: state.eligible_voters,
                non_voters: state.non_voters,
                votes: state.votes,
                direct_seats: state.direct_seats,
                final_seats: ledger.seats,
                district,
            }
        })
        .collect();

    Ok(ElectionOutcome {
        plan,
        districts,
        leveling,
        placement,
        national_direct: tally.national_direct,
        national_final,
        valid_votes: tally.national.valid_votes,
        blank_votes: tally.national.blank_votes,
        votes_cast: tally.national.votes_cast,
        non_voters: params.counts_non_voters().then_some(tally.national.non_voters),
        hard_excluded: tally.hard_excluded,
    })
}
