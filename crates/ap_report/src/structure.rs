//! Report data model + mapper from `ElectionOutcome`.
//! No recomputation: every number is read off the outcome or the parameter set.

use ap_algo::{PartyStanding, Standing};
use ap_core::{
    ids::{DistrictId, PartyId},
    variables::Params,
};
use ap_io::{hasher::res_id_from_canonical, loader::InputDigests};
use ap_pipeline::{DistrictOutcome, ElectionOutcome};
use serde::Serialize;

use crate::ReportError;

// -------------------- Model (section order = output order) --------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportModel {
    /// `RES:<sha256>` over the canonical bytes of the model without this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub summary: SummaryBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputDigests>,
    pub parties: Vec<PartyRow>,
    pub districts: Vec<DistrictRow>,
    pub leveling: LevelingBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryBlock {
    pub total_seats: u32,
    pub leveling_seats_per_district: u32,
    pub district_method: String,
    pub national_method: String,
    pub first_divisor: String,
    pub leveling_threshold_pct: String,
    pub seat_plan: String,
    pub hard_threshold: bool,
    pub valid_votes: u64,
    pub blank_votes: u64,
    pub votes_cast: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_voters: Option<u64>,
    pub district_count: usize,
    pub hard_excluded: Vec<PartyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyRow {
    pub party: PartyId,
    pub votes: u64,
    pub share_pct: String,
    pub status: &'static str,
    /// Seats without leveling.
    pub direct_seats: u32,
    /// National entitlement from the resolver (direct seats when not competing).
    pub entitlement: u32,
    /// Leveling seats actually placed in a district.
    pub leveling_seats: u32,
    pub final_seats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes_to_threshold: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatRow {
    pub party: PartyId,
    pub seats: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictRow {
    pub district: DistrictId,
    pub planned_seats: u32,
    pub direct_pool: u32,
    pub leveling_seats: u32,
    pub valid_votes: u64,
    pub blank_votes: u64,
    pub votes_cast: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible_voters: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_voters: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation_pct: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blank_pct_of_eligible: Option<String>,
    /// Ballots cast per planned seat, blanks included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes_per_seat: Option<String>,
    pub direct_seats: Vec<SeatRow>,
    pub final_seats: Vec<SeatRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leveling_award: Option<PartyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwardRow {
    pub district: DistrictId,
    pub party: PartyId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelingBlock {
    pub pool: u32,
    pub scans: u32,
    pub awards: Vec<AwardRow>,
    pub unplaced: Vec<SeatRow>,
}

// -------------------- Mapper --------------------

/// Build the report and stamp its `RES:` id.
pub fn build_model(
    outcome: &ElectionOutcome,
    params: &Params,
    digests: Option<&InputDigests>,
) -> Result<ReportModel, ReportError> {
    let mut model = ReportModel {
        id: None,
        summary: summary(outcome, params),
        inputs: digests.cloned(),
        parties: outcome.parties().iter().map(|s| party_row(outcome, s)).collect(),
        districts: outcome.districts.iter().map(district_row).collect(),
        leveling: leveling_block(outcome),
    };
    model.id = Some(res_id_from_canonical(&model)?);
    Ok(model)
}

fn summary(outcome: &ElectionOutcome, params: &Params) -> SummaryBlock {
    SummaryBlock {
        total_seats: params.total_seats,
        leveling_seats_per_district: params.leveling_seats_per_district,
        district_method: params.district_method.token().to_owned(),
        national_method: params.national_method.token().to_owned(),
        first_divisor: params.first_divisor.to_string(),
        leveling_threshold_pct: params.leveling_threshold_pct.to_string(),
        seat_plan: params.seat_plan.token().to_owned(),
        hard_threshold: params.hard_threshold,
        valid_votes: outcome.valid_votes,
        blank_votes: outcome.blank_votes,
        votes_cast: outcome.votes_cast,
        non_voters: outcome.non_voters,
        district_count: outcome.districts.len(),
        hard_excluded: outcome.hard_excluded.clone(),
    }
}

fn status_token(s: Standing) -> &'static str {
    match s {
        Standing::Competing => "competing",
        Standing::BelowThreshold => "below_threshold",
        Standing::OverRepresented => "over_represented",
    }
}

fn party_row(outcome: &ElectionOutcome, s: &PartyStanding) -> PartyRow {
    PartyRow {
        party: s.party.clone(),
        votes: s.votes,
        share_pct: format!("{:.2}", s.share_pct),
        status: status_token(s.status),
        direct_seats: s.direct,
        entitlement: s.national_seats,
        leveling_seats: outcome.placement.awarded_to(&s.party),
        final_seats: outcome.national_final.get(&s.party).copied().unwrap_or(0),
        votes_to_threshold: s.votes_to_threshold,
    }
}

fn seat_rows(d: &DistrictOutcome, seats: &ap_algo::SeatMap<PartyId>) -> Vec<SeatRow> {
    d.votes
        .iter()
        .map(|(party, _)| SeatRow {
            party: party.clone(),
            seats: seats.get(party).copied().unwrap_or(0),
        })
        .collect()
}

fn district_row(d: &DistrictOutcome) -> DistrictRow {
    DistrictRow {
        district: d.district.clone(),
        planned_seats: d.planned_seats,
        direct_pool: d.direct_pool,
        leveling_seats: d.leveling_seats,
        valid_votes: d.valid_votes,
        blank_votes: d.blank_votes,
        votes_cast: d.votes_cast,
        eligible_voters: d.eligible_voters,
        non_voters: d.non_voters,
        participation_pct: d.participation_pct.map(|v| format!("{v:.2}")),
        blank_pct_of_eligible: d.blank_pct_of_eligible.map(|v| format!("{v:.2}")),
        votes_per_seat: d.votes_per_seat.map(|v| format!("{v:.2}")),
        direct_seats: seat_rows(d, &d.direct_seats),
        final_seats: seat_rows(d, &d.final_seats),
        leveling_award: d.leveling_award.clone(),
    }
}

fn leveling_block(outcome: &ElectionOutcome) -> LevelingBlock {
    // Awards follow the district table, not the map's key order.
    let awards = outcome
        .districts
        .iter()
        .filter_map(|d| {
            d.leveling_award
                .as_ref()
                .map(|party| AwardRow { district: d.district.clone(), party: party.clone() })
        })
        .collect();
    LevelingBlock {
        pool: outcome.leveling.pool,
        scans: outcome.leveling.scans,
        awards,
        unplaced: outcome
            .placement
            .unplaced
            .iter()
            .map(|(party, seats)| SeatRow { party: party.clone(), seats: *seats })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_io::loader::{DistrictRow as RefRow, DistrictTable, ElectionInput, VoteRow, VoteTable};

    fn input() -> ElectionInput {
        let row = |d: &str, p: &str, v: u64| VoteRow {
            district: d.parse().unwrap(),
            party: p.parse().unwrap(),
            votes: v,
        };
        ElectionInput {
            votes: VoteTable {
                rows: vec![
                    row("D1", "A", 100),
                    row("D1", "B", 80),
                    row("D2", "A", 40),
                    row("D2", "B", 60),
                    row("D3", "A", 10),
                    row("D3", "B", 50),
                ],
            },
            districts: DistrictTable {
                districts: [("D1", 400.0), ("D2", 300.0), ("D3", 300.0)]
                    .iter()
                    .map(|(id, pop)| RefRow {
                        id: id.parse().unwrap(),
                        population: *pop,
                        area: 0.0,
                        eligible_voters: Some((*pop as u64) / 2),
                    })
                    .collect(),
            },
            ..ElectionInput::default()
        }
    }

    fn params() -> Params {
        Params { total_seats: 10, ..Params::default() }
    }

    fn model(params: &Params) -> ReportModel {
        let outcome = ap_pipeline::run(&input(), params).unwrap();
        build_model(&outcome, params, None).unwrap()
    }

    #[test]
    fn id_is_stable_and_tracks_content() {
        let a = model(&params());
        let b = model(&params());
        let id = a.id.clone().unwrap();
        assert!(id.starts_with("RES:"));
        assert_eq!(id.len(), 4 + 64);
        assert_eq!(a, b);

        let c = model(&Params { leveling_threshold_pct: 5.0, ..params() });
        assert_ne!(c.id, a.id);
    }

    #[test]
    fn party_rows_carry_direct_and_leveling_seats() {
        let m = model(&params());
        let a = &m.parties[0];
        assert_eq!(a.party.as_str(), "A");
        assert_eq!((a.direct_seats, a.leveling_seats, a.final_seats), (3, 1, 4));
        assert_eq!(a.status, "competing");
        assert_eq!(a.share_pct, "44.12");
        assert_eq!(a.votes_to_threshold, Some(0));
    }

    #[test]
    fn district_rows_list_every_party_in_table_order() {
        let m = model(&params());
        let d3 = &m.districts[2];
        assert_eq!(d3.direct_seats.len(), 2);
        assert_eq!(d3.direct_seats[0].party.as_str(), "A");
        assert_eq!(d3.direct_seats[0].seats, 0);
        assert_eq!(d3.final_seats[0].seats, 1);
        assert_eq!(d3.votes_per_seat.as_deref(), Some("20.00"));
        assert_eq!(m.leveling.awards.len(), 3);
        assert_eq!(m.leveling.awards[0].district.as_str(), "D1");
        assert!(m.leveling.unplaced.is_empty());
    }

    #[test]
    fn turnout_columns_read_off_the_outcome() {
        let m = model(&params());
        let d1 = &m.districts[0];
        assert_eq!((d1.votes_cast, d1.eligible_voters), (180, Some(200)));
        assert_eq!(d1.participation_pct.as_deref(), Some("90.00"));
        assert_eq!(d1.blank_pct_of_eligible.as_deref(), Some("0.00"));
        assert_eq!(d1.non_voters, None);
        assert_eq!((m.summary.votes_cast, m.summary.non_voters), (340, None));
    }
}
