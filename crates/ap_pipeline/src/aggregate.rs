//! AGGREGATE stage: fold the vote table into one constituency per planned
//! district and a national tally.
//!
//! - Rows are applied in table order; duplicate (district, party) rows sum.
//! - Transfers rename a party before its votes are counted (one hop).
//! - Adjustments add votes to a party already present in the district.
//! - The blank label is kept out of competition and out of the valid-vote
//!   totals unless `blank_competes` is set.
//! - With non-voter counting on, eligible voters minus ballots cast enter each
//!   district as a pseudo-party (blank ballots too when combined). The label
//!   follows every table party in national order.

use std::collections::BTreeMap;

use ap_algo::{Constituency, SeatMap, SeatPlan};
use ap_core::{
    determinism::TableOrder,
    ids::{DistrictId, PartyId},
    variables::Params,
};
use ap_io::loader::ElectionInput;
use tracing::{debug, info};

use crate::{DataError, PipelineError};

/// Mutable per-district state carried through the stages.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictState {
    pub constituency: Constituency,
    pub planned_seats: u32,
    /// Competing votes before any hard exclusion.
    pub votes: Vec<(PartyId, u64)>,
    /// Competing votes (threshold and placement denominator).
    pub valid_votes: u64,
    /// Ballots under the blank label, competing or not.
    pub blank_votes: u64,
    /// Every ballot in the table for this district, blanks included.
    pub votes_cast: u64,
    pub eligible_voters: Option<u64>,
    /// Set when non-voters are counted.
    pub non_voters: Option<u64>,
    /// Filled by the direct-seat stage.
    pub direct_seats: SeatMap<PartyId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationalTally {
    /// National votes per competing label, table order.
    pub votes: Vec<(PartyId, u64)>,
    /// Threshold denominator.
    pub valid_votes: u64,
    pub blank_votes: u64,
    pub votes_cast: u64,
    pub non_voters: u64,
}

/// District and national state for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    pub districts: Vec<DistrictState>,
    pub national: NationalTally,
    /// Filled by the direct-seat stage.
    pub national_direct: BTreeMap<PartyId, u32>,
    /// Filled by the direct-seat stage when the hard threshold is on.
    pub hard_excluded: Vec<PartyId>,
}

struct BlankRule<'a> {
    label: Option<&'a str>,
    competes: bool,
}

impl BlankRule<'_> {
    fn is_blank(&self, party: &PartyId) -> bool {
        self.label == Some(party.as_str())
    }
}

/// Ballot counters of one district while rows are applied.
struct Counting {
    constituency: Constituency,
    planned_seats: u32,
    cast: u64,
    blanks: u64,
}

impl Counting {
    fn credit(
        &mut self,
        party: &PartyId,
        votes: u64,
        blank: &BlankRule<'_>,
        parties: &mut TableOrder<PartyId>,
    ) {
        self.cast += votes;
        let is_blank = blank.is_blank(party);
        if is_blank {
            self.blanks += votes;
        }
        if !is_blank || blank.competes {
            parties.insert(party);
            self.constituency.add_votes(party, votes);
        }
    }
}

pub fn aggregate(
    input: &ElectionInput,
    plan: &SeatPlan,
    params: &Params,
) -> Result<Tally, PipelineError> {
    let mut order: TableOrder<DistrictId> = TableOrder::new();
    let mut districts: Vec<Counting> = Vec::with_capacity(plan.len());
    for (id, seats) in plan.iter() {
        order.insert(id);
        let constituency = Constituency::new(id.clone(), seats, params.leveling_seats_per_district)?;
        districts.push(Counting { constituency, planned_seats: seats, cast: 0, blanks: 0 });
    }

    let transfers: BTreeMap<&PartyId, &PartyId> =
        input.adjustments.transfers.iter().map(|t| (&t.from, &t.to)).collect();
    let renamed = |p: &PartyId| -> PartyId {
        transfers.get(p).map_or_else(|| p.clone(), |to| (*to).clone())
    };
    let blank = BlankRule { label: params.blank_label.as_deref(), competes: params.blank_competes };

    let mut parties: TableOrder<PartyId> = TableOrder::new();
    for row in &input.votes.rows {
        let ix = order.position(&row.district).ok_or_else(|| DataError::UnknownDistrict {
            district: row.district.clone(),
            context: "vote table",
        })?;
        districts[ix].credit(&renamed(&row.party), row.votes, &blank, &mut parties);
    }

    for add in &input.adjustments.add {
        let ix = order.position(&add.district).ok_or_else(|| DataError::UnknownDistrict {
            district: add.district.clone(),
            context: "vote adjustment",
        })?;
        let party = renamed(&add.party);
        let district = &mut districts[ix];
        if !blank.is_blank(&party) && !district.constituency.contains(&party) {
            return Err(DataError::UnknownParty { district: add.district.clone(), party }.into());
        }
        district.credit(&party, add.votes, &blank, &mut parties);
    }

    let eligible: BTreeMap<&DistrictId, Option<u64>> =
        input.districts.districts.iter().map(|r| (&r.id, r.eligible_voters)).collect();
    let non_voter_label: Option<PartyId> = if params.counts_non_voters() {
        Some(params.non_voter_label.parse()?)
    } else {
        None
    };

    let mut national_votes: BTreeMap<PartyId, u64> = BTreeMap::new();
    let mut national = NationalTally::default();
    let mut states: Vec<DistrictState> = Vec::with_capacity(districts.len());
    for Counting { mut constituency, planned_seats, cast, blanks } in districts {
        let id = constituency.district().clone();
        let eligible_voters = eligible.get(&id).copied().flatten();

        let non_voters = match &non_voter_label {
            Some(label) => {
                let eligible = eligible_voters
                    .ok_or_else(|| DataError::MissingEligibleVoters(id.clone()))?;
                let stayed_home = eligible.checked_sub(cast).ok_or_else(|| {
                    DataError::EligibleBelowCast { district: id.clone(), eligible, cast }
                })?;
                let pseudo =
                    if params.combine_blank_non_voters { stayed_home + blanks } else { stayed_home };
                parties.insert(label);
                constituency.add_votes(label, pseudo);
                national.non_voters += stayed_home;
                Some(stayed_home)
            }
            None => None,
        };

        for (p, v) in constituency.votes() {
            *national_votes.entry(p.clone()).or_insert(0) += v;
        }
        national.blank_votes += blanks;
        national.votes_cast += cast;
        debug!(
            district = %id,
            parties = constituency.votes().len(),
            valid = constituency.valid_votes(),
            blank = blanks,
            cast,
            non_voters = ?non_voters,
            "district tallied"
        );
        states.push(DistrictState {
            votes: constituency.votes().to_vec(),
            valid_votes: constituency.valid_votes(),
            constituency,
            planned_seats,
            blank_votes: blanks,
            votes_cast: cast,
            eligible_voters,
            non_voters,
            direct_seats: SeatMap::new(),
        });
    }

    national.votes = parties
        .iter()
        .map(|p| (p.clone(), national_votes.get(p).copied().unwrap_or(0)))
        .collect();
    national.valid_votes = national.votes.iter().map(|(_, v)| v).sum();

    info!(
        parties = national.votes.len(),
        valid_votes = national.valid_votes,
        blank_votes = national.blank_votes,
        non_voters = national.non_voters,
        "votes aggregated"
    );
    Ok(Tally {
        districts: states,
        national,
        national_direct: BTreeMap::new(),
        hard_excluded: Vec::new(),
    })
}
