//! PLACE stage: turn national leveling seats into district awards.

use ap_algo::{
    place_leveling_seats, DistrictLedger, LevelingOutcome, PlacementError, PlacementOutcome,
    Standing,
};
use ap_core::{ids::PartyId, variables::Params};
use tracing::{debug, info, warn};

use crate::aggregate::Tally;
use crate::methods::district_method;

/// Placement result plus the per-district ledgers (seats include the award).
#[derive(Debug, Clone)]
pub struct Placed {
    pub outcome: PlacementOutcome,
    pub ledgers: Vec<DistrictLedger>,
}

pub fn place(
    tally: &Tally,
    leveling: &LevelingOutcome,
    params: &Params,
) -> Result<Placed, PlacementError> {
    let mut ledgers: Vec<DistrictLedger> = tally
        .districts
        .iter()
        .map(|d| DistrictLedger {
            district: d.constituency.district().clone(),
            direct_pool: d.constituency.direct_pool(),
            leveling_seats: d.constituency.leveling_seats(),
            valid_votes: d.valid_votes,
            votes: d.votes.clone(),
            seats: d.direct_seats.clone(),
        })
        .collect();

    let wanted: Vec<(PartyId, u32)> = leveling
        .standings
        .iter()
        .filter(|s| s.status == Standing::Competing && s.leveling_seats > 0)
        .map(|s| (s.party.clone(), s.leveling_seats))
        .collect();

    let outcome = place_leveling_seats(&mut ledgers, &wanted, &district_method(params))?;

    for (district, party) in &outcome.awards {
        debug!(%district, %party, "leveling seat placed");
    }
    for (party, seats) in &outcome.unplaced {
        warn!(%party, seats, "leveling seats without an eligible district");
    }
    info!(awards = outcome.awards.len(), "leveling seats placed");
    Ok(Placed { outcome, ledgers })
}
