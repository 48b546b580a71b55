// crates/ap_algo/src/lib.rs
#![forbid(unsafe_code)]

// Core IDs and method domains
pub use ap_core::{
    ids::{DistrictId, PartyId},
    variables::MethodKind,
};

// ----------------------------- Apportionment engine ---------------------------------

pub mod allocation {
    // File modules (actual implementations)
    pub mod fptp;
    pub mod highest_averages;
    pub mod method;

    pub use highest_averages::Priority;
    pub use method::{seat_pool, AllocError, Method, SeatMap};
}

pub use allocation::{seat_pool, AllocError, Method, Priority, SeatMap};

// ----------------------------- Two-tier seat stages ---------------------------------

// File modules
pub mod constituency;
pub mod leveling;
pub mod placement;
pub mod seat_plan;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use constituency::{Constituency, ConstituencyError};
pub use leveling::{
    resolve_leveling, votes_to_threshold, LevelingError, LevelingInput, LevelingOutcome,
    PartyStanding, Standing,
};
pub use placement::{
    place_leveling_seats, DistrictLedger, PlacementError, PlacementOutcome, QuotientRow,
    RestQuotient,
};
pub use seat_plan::{plan_district_seats, DistrictProfile, PlanError, PlanScheme, SeatPlan};
