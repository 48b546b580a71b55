//! PLAN stage: spread the national seat count over the reference districts.

use ap_algo::{plan_district_seats, DistrictProfile, PlanError, SeatPlan};
use ap_core::variables::Params;
use ap_io::loader::DistrictTable;
use tracing::{debug, info};

use crate::methods::plan_scheme;

pub fn plan_seats(table: &DistrictTable, params: &Params) -> Result<SeatPlan, PlanError> {
    let profiles: Vec<DistrictProfile> = table
        .districts
        .iter()
        .map(|row| DistrictProfile {
            id: row.id.clone(),
            population: row.population,
            area: row.area,
        })
        .collect();

    let scheme = plan_scheme(params);
    let plan = plan_district_seats(params.total_seats, &profiles, params.area_multiplier, &scheme)?;

    for (district, seats) in plan.iter() {
        debug!(%district, seats, "planned district seats");
    }
    info!(districts = plan.len(), total = plan.total(), seat_plan = %params.seat_plan, "seat plan ready");
    Ok(plan)
}
