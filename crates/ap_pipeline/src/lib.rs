//! ap_pipeline: deterministic run surface
//! (merge → plan → aggregate → direct seats → leveling → placement → outcome).
//!
//! The crate is I/O-free: inputs arrive already loaded by `ap_io`, all seat
//! arithmetic lives in `ap_algo`. Each stage is a module; `run` sequences them
//! and owns no algorithmic logic.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use ap_algo::{
    ConstituencyError, LevelingError, LevelingOutcome, PartyStanding, PlacementError,
    PlacementOutcome, PlanError, SeatMap, SeatPlan,
};
use ap_core::{
    ids::{DistrictId, PartyId},
    variables::Params,
    CoreError,
};
use ap_io::loader::ElectionInput;
use thiserror::Error;
use tracing::info;

pub mod aggregate;
pub mod allocate;
pub mod build_result;
pub mod leveling;
pub mod merge;
pub mod methods;
pub mod place;
pub mod plan;

/// Inputs that reference something the run does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("{context} names district {district}, which is not in the reference table")]
    UnknownDistrict { district: DistrictId, context: &'static str },
    #[error("adjustment names party {party}, which has no votes in district {district}")]
    UnknownParty { district: DistrictId, party: PartyId },
    #[error("merge target {0} is also a district outside the merge")]
    MergeCollision(DistrictId),
    #[error("district {0} has no eligible-voter count")]
    MissingEligibleVoters(DistrictId),
    #[error("district {district} has {eligible} eligible voters but {cast} ballots cast")]
    EligibleBelowCast { district: DistrictId, eligible: u64, cast: u64 },
}

/// Single error surface for the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration: {0}")]
    Config(#[from] CoreError),
    #[error("data: {0}")]
    Data(#[from] DataError),
    #[error("seat plan: {0}")]
    Plan(#[from] PlanError),
    #[error("direct seats: {0}")]
    Allocate(#[from] ConstituencyError),
    #[error("leveling: {0}")]
    Leveling(#[from] LevelingError),
    #[error("leveling placement: {0}")]
    Placement(#[from] PlacementError),
    #[error("national seats sum to {actual}, configured total is {expected}")]
    SeatTotalMismatch { expected: u32, actual: u64 },
}

/// Final state of one district.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictOutcome {
    pub district: DistrictId,
    pub planned_seats: u32,
    pub direct_pool: u32,
    pub leveling_seats: u32,
    /// Competing votes in the district (hard-excluded parties included).
    pub valid_votes: u64,
    pub blank_votes: u64,
    /// All ballots, blanks included.
    pub votes_cast: u64,
    pub eligible_voters: Option<u64>,
    pub non_voters: Option<u64>,
    /// `votes_cast / eligible_voters` in percent.
    pub participation_pct: Option<f64>,
    pub blank_pct_of_eligible: Option<f64>,
    /// Per-party votes after adjustments and transfers, table order.
    pub votes: Vec<(PartyId, u64)>,
    pub direct_seats: SeatMap<PartyId>,
    pub final_seats: SeatMap<PartyId>,
    pub leveling_award: Option<PartyId>,
    /// `votes_cast / planned_seats`; `None` for a district planned at zero seats.
    pub votes_per_seat: Option<f64>,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectionOutcome {
    pub plan: SeatPlan,
    pub districts: Vec<DistrictOutcome>,
    pub leveling: LevelingOutcome,
    pub placement: PlacementOutcome,
    /// National direct seats per party.
    pub national_direct: BTreeMap<PartyId, u32>,
    /// National seats actually placed (direct + placed leveling).
    pub national_final: BTreeMap<PartyId, u32>,
    pub valid_votes: u64,
    pub blank_votes: u64,
    pub votes_cast: u64,
    /// Set when non-voters are counted.
    pub non_voters: Option<u64>,
    /// Parties removed from every district by the hard threshold.
    pub hard_excluded: Vec<PartyId>,
}

impl ElectionOutcome {
    pub fn district(&self, id: &DistrictId) -> Option<&DistrictOutcome> {
        self.districts.iter().find(|d| &d.district == id)
    }

    /// Party standings in national table order.
    pub fn parties(&self) -> &[PartyStanding] {
        &self.leveling.standings
    }
}

/// Run every stage in order over one election.
pub fn run(input: &ElectionInput, params: &Params) -> Result<ElectionOutcome, PipelineError> {
    params.validate_domains()?;
    let input = merge::apply(input)?;
    info!(
        total_seats = params.total_seats,
        districts = input.districts.districts.len(),
        rows = input.votes.rows.len(),
        "apportionment run start"
    );

    let plan = plan::plan_seats(&input.districts, params)?;
    let tally = aggregate::aggregate(&input, &plan, params)?;
    let direct = allocate::allocate_direct(tally, params)?;
    let leveling = leveling::resolve(&direct, params)?;
    let placed = place::place(&direct, &leveling, params)?;
    let outcome = build_result::build(plan, direct, leveling, placed, params)?;

    info!(
        districts = outcome.districts.len(),
        leveling_awards = outcome.placement.awards.len(),
        "apportionment run done"
    );
    Ok(outcome)
}
