//! variables.rs
//! Method domains, the run parameter set with safe defaults, and domain validation.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// ------------ Macros ------------

/// Define a serde'd enum with explicit wire tokens.
macro_rules! serde_enum {
    ($(#[$m:meta])* $name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Wire token for this variant.
            pub const fn token(self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}

/// ------------ Canonical enums (wire tokens explicit) ------------

serde_enum!(
    /// Apportionment method family, selected by configuration.
    MethodKind => {
        SainteLague    = "sainte_lague",
        DHondt         = "dhondt",
        HuntingtonHill = "huntington_hill",
        FirstPastThePost = "fptp"
    }
);

serde_enum!(
    /// How the national seat count is spread over districts.
    SeatPlanKind => {
        Proportional      = "proportional",
        GuaranteedMinimum = "guaranteed_minimum"
    }
);

impl FromStr for MethodKind {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sainte_lague" | "sainte-lague" | "stlague" => Ok(MethodKind::SainteLague),
            "dhondt" | "d_hondt" | "d'hondt" => Ok(MethodKind::DHondt),
            "huntington_hill" | "hunthill" | "hh" => Ok(MethodKind::HuntingtonHill),
            "fptp" | "first_past_the_post" => Ok(MethodKind::FirstPastThePost),
            _ => Err(CoreError::UnknownMethod(s.to_owned())),
        }
    }
}

/// ------------ Params ------------

/// Run configuration. Every field has a default, so a parameter file only needs
/// to name what differs from the 169-seat, Sainte-Laguë 1.4, 4 % baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// National seat count (grand total).
    pub total_seats: u32,
    /// Seats held back in every district for leveling (0 disables leveling).
    pub leveling_seats_per_district: u32,

    /// Method for direct seats inside each district.
    pub district_method: MethodKind,
    /// Method for the national leveling computation (and the proportional seat plan).
    pub national_method: MethodKind,
    /// First divisor for direct seats under Sainte-Laguë / D'Hondt.
    pub first_divisor: f64,

    /// Inclusive vote-share threshold (percent of valid votes) for leveling seats.
    pub leveling_threshold_pct: f64,
    /// A party below the threshold still competes if it holds ≥ 1 direct seat.
    pub single_seat_leveling: bool,
    /// Parties below the threshold get no seats anywhere, not just no leveling seats.
    pub hard_threshold: bool,

    /// Seat plan: district score = area × multiplier + population.
    pub seat_plan: SeatPlanKind,
    pub area_multiplier: f64,
    /// Huntington-Hill seat floor (guaranteed-minimum plan and HH direct seats).
    pub plan_initial_seats: u32,
    /// Flat seats added per district under the guaranteed-minimum plan.
    pub plan_at_large_seats: u32,
    /// Huntington-Hill preliminary filter (percent) for direct seats.
    pub hh_threshold_pct: f64,

    /// Vote label carrying blank ballots, if the table has one.
    pub blank_label: Option<String>,
    /// Count blank ballots as a competing party.
    pub blank_competes: bool,

    /// Enter non-voters (eligible voters minus ballots cast) as a competing
    /// pseudo-party. Needs `eligible_voters` on every district.
    pub count_non_voters: bool,
    /// Like `count_non_voters`, with blank ballots folded into the same pseudo-party.
    pub combine_blank_non_voters: bool,
    /// Label of the non-voter pseudo-party.
    pub non_voter_label: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            total_seats: 169,
            leveling_seats_per_district: 1,
            district_method: MethodKind::SainteLague,
            national_method: MethodKind::SainteLague,
            first_divisor: 1.4,
            leveling_threshold_pct: 4.0,
            single_seat_leveling: false,
            hard_threshold: false,
            seat_plan: SeatPlanKind::Proportional,
            area_multiplier: 1.8,
            plan_initial_seats: 1,
            plan_at_large_seats: 2,
            hh_threshold_pct: 4.0,
            blank_label: Some("BLANKE".to_owned()),
            blank_competes: false,
            count_non_voters: false,
            combine_blank_non_voters: false,
            non_voter_label: "HJEM".to_owned(),
        }
    }
}

/// -------- Validation (domain + cross-field consistency) --------

fn pct_in_range(name: &str, v: f64) -> Result<(), CoreError> {
    if v.is_finite() && (0.0..=100.0).contains(&v) {
        Ok(())
    } else {
        Err(CoreError::DomainOutOfRange(format!("{name} must be finite in [0,100], got {v}")))
    }
}

impl Params {
    /// Validate numeric domains and cross-field consistency.
    pub fn validate_domains(&self) -> Result<(), CoreError> {
        pct_in_range("leveling_threshold_pct", self.leveling_threshold_pct)?;
        pct_in_range("hh_threshold_pct", self.hh_threshold_pct)?;

        if !self.first_divisor.is_finite() || self.first_divisor <= 0.0 {
            return Err(CoreError::DomainOutOfRange(format!(
                "first_divisor must be finite and > 0, got {}",
                self.first_divisor
            )));
        }
        if !self.area_multiplier.is_finite() || self.area_multiplier < 0.0 {
            return Err(CoreError::DomainOutOfRange(format!(
                "area_multiplier must be finite and >= 0, got {}",
                self.area_multiplier
            )));
        }
        if self.leveling_seats_per_district > self.total_seats {
            return Err(CoreError::DomainOutOfRange(format!(
                "leveling_seats_per_district ({}) exceeds total_seats ({})",
                self.leveling_seats_per_district, self.total_seats
            )));
        }
        if let Some(label) = &self.blank_label {
            if !crate::ids::is_valid_token(label) {
                return Err(CoreError::InvalidToken(label.clone()));
            }
        }
        if self.blank_competes && self.blank_label.is_none() {
            return Err(CoreError::DomainOutOfRange(
                "blank_competes=true requires blank_label".into(),
            ));
        }
        if self.blank_competes && self.combine_blank_non_voters {
            return Err(CoreError::DomainOutOfRange(
                "blank_competes and combine_blank_non_voters are mutually exclusive".into(),
            ));
        }
        if !crate::ids::is_valid_token(&self.non_voter_label) {
            return Err(CoreError::InvalidToken(self.non_voter_label.clone()));
        }
        if self.blank_label.as_deref() == Some(self.non_voter_label.as_str()) {
            return Err(CoreError::DomainOutOfRange(format!(
                "non_voter_label must differ from blank_label ({})",
                self.non_voter_label
            )));
        }
        Ok(())
    }

    /// True when non-voters enter the count, alone or merged with blanks.
    #[inline]
    pub fn counts_non_voters(&self) -> bool {
        self.count_non_voters || self.combine_blank_non_voters
    }
}
