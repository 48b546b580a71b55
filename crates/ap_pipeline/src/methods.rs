//! Map the parameter set onto concrete `Method` / `PlanScheme` values.

use ap_algo::{Method, PlanScheme};
use ap_core::variables::{MethodKind, Params, SeatPlanKind};

/// Method for direct seats inside a district. Its rest divisor also ranks
/// leveling placement.
pub fn district_method(params: &Params) -> Method {
    match params.district_method {
        MethodKind::HuntingtonHill => Method::HuntingtonHill {
            initial_seats: params.plan_initial_seats,
            threshold_pct: params.hh_threshold_pct,
        },
        kind => Method::standard(kind).with_first_divisor(params.first_divisor),
    }
}

/// Method for the national leveling computation (tabled defaults:
/// Sainte-Laguë starts at 1.4).
pub fn national_method(params: &Params) -> Method {
    Method::standard(params.national_method)
}

/// Seat plan scheme. The proportional plan uses D'Hondt when the national
/// method is D'Hondt and Sainte-Laguë otherwise, both with first divisor 1.
pub fn plan_scheme(params: &Params) -> PlanScheme {
    match params.seat_plan {
        SeatPlanKind::Proportional => {
            let kind = match params.national_method {
                MethodKind::DHondt => MethodKind::DHondt,
                _ => MethodKind::SainteLague,
            };
            PlanScheme::Proportional(Method::standard(kind).with_first_divisor(1.0))
        }
        SeatPlanKind::GuaranteedMinimum => PlanScheme::GuaranteedMinimum {
            initial_seats: params.plan_initial_seats,
            at_large: params.plan_at_large_seats,
        },
    }
}
