//! LEVELING stage: national leveling entitlements from the direct-seat tally.

use ap_algo::{resolve_leveling, LevelingError, LevelingInput, LevelingOutcome, Standing};
use ap_core::variables::Params;
use tracing::{debug, info};

use crate::aggregate::Tally;
use crate::methods::national_method;

pub fn resolve(tally: &Tally, params: &Params) -> Result<LevelingOutcome, LevelingError> {
    let input = LevelingInput {
        national_seats: params.total_seats,
        votes: &tally.national.votes,
        direct_seats: &tally.national_direct,
        valid_votes: tally.national.valid_votes,
        threshold_pct: params.leveling_threshold_pct,
        single_seat_rule: params.single_seat_leveling,
        method: national_method(params),
    };
    let outcome = resolve_leveling(&input)?;

    for s in &outcome.standings {
        debug!(
            party = %s.party,
            share_pct = s.share_pct,
            direct = s.direct,
            national = s.national_seats,
            status = ?s.status,
            "party standing"
        );
    }
    let competing = outcome.standings.iter().filter(|s| s.status == Standing::Competing).count();
    info!(competing, scans = outcome.scans, pool = outcome.pool, "leveling resolved");
    Ok(outcome)
}
