//! End-to-end runs over small hand-checked elections.

use ap_algo::Standing;
use ap_core::{
    ids::{DistrictId, PartyId},
    variables::{MethodKind, Params, SeatPlanKind},
};
use ap_io::loader::{
    load_all_from_manifest, Adjustments, DistrictMerge, DistrictRow, DistrictTable, ElectionInput,
    VoteAddition, VoteRow, VoteTable,
};
use ap_pipeline::{run, DataError, PipelineError};

fn pid(s: &str) -> PartyId {
    s.parse().unwrap()
}

fn did(s: &str) -> DistrictId {
    s.parse().unwrap()
}

fn districts(pops: &[(&str, f64)]) -> DistrictTable {
    DistrictTable {
        districts: pops
            .iter()
            .map(|(id, p)| DistrictRow {
                id: did(id),
                population: *p,
                area: 0.0,
                eligible_voters: None,
            })
            .collect(),
    }
}

fn votes(rows: &[(&str, &str, u64)]) -> VoteTable {
    VoteTable {
        rows: rows
            .iter()
            .map(|(d, p, v)| VoteRow { district: did(d), party: pid(p), votes: *v })
            .collect(),
    }
}

/// Party A {100, 40, 10}, party B {80, 60, 50} in districts D1..D3.
fn three_districts(pops: &[(&str, f64)]) -> ElectionInput {
    ElectionInput {
        votes: votes(&[
            ("D1", "A", 100),
            ("D1", "B", 80),
            ("D2", "A", 40),
            ("D2", "B", 60),
            ("D3", "A", 10),
            ("D3", "B", 50),
        ]),
        districts: districts(pops),
        adjustments: Adjustments::default(),
    }
}

#[test]
fn direct_seats_match_manual_divisor_sequence() {
    // Plan {3,2,2} from populations 300/200/200 (Sainte-Laguë, first divisor 1).
    let input = three_districts(&[("D1", 300.0), ("D2", 200.0), ("D3", 200.0)]);
    let params = Params { total_seats: 7, leveling_seats_per_district: 0, ..Params::default() };
    let out = run(&input, &params).unwrap();

    let seats = |d: &str, p: &str| out.district(&did(d)).unwrap().direct_seats[&pid(p)];
    assert_eq!(out.district(&did("D1")).unwrap().planned_seats, 3);
    assert_eq!((seats("D1", "A"), seats("D1", "B")), (2, 1));
    assert_eq!((seats("D2", "A"), seats("D2", "B")), (1, 1));
    assert_eq!((seats("D3", "A"), seats("D3", "B")), (0, 2));

    // Both parties already hold their national entitlement: nothing to level.
    assert!(out.placement.awards.is_empty());
    assert!(out.parties().iter().all(|s| s.status == Standing::OverRepresented));
    assert_eq!(out.national_final[&pid("A")], 3);
    assert_eq!(out.national_final[&pid("B")], 4);
}

#[test]
fn leveling_seats_are_resolved_and_placed() {
    // Plan {4,3,3}; one leveling seat per district leaves direct pools {3,2,2}.
    let input = three_districts(&[("D1", 400.0), ("D2", 300.0), ("D3", 300.0)]);
    let params = Params { total_seats: 10, ..Params::default() };
    let out = run(&input, &params).unwrap();

    let a = out.leveling.standing(&pid("A")).unwrap();
    let b = out.leveling.standing(&pid("B")).unwrap();
    assert_eq!((a.direct, a.national_seats, a.leveling_seats), (3, 4, 1));
    assert_eq!((b.direct, b.national_seats, b.leveling_seats), (4, 6, 2));
    assert_eq!(out.leveling.national_total(), 10);

    assert_eq!(out.placement.awards[&did("D1")], pid("B"));
    assert_eq!(out.placement.awards[&did("D2")], pid("B"));
    assert_eq!(out.placement.awards[&did("D3")], pid("A"));
    assert!(out.placement.unplaced.is_empty());

    let d3 = out.district(&did("D3")).unwrap();
    assert_eq!(d3.leveling_award, Some(pid("A")));
    assert_eq!(d3.final_seats[&pid("A")], 1);
    assert_eq!(out.national_final[&pid("A")], 4);
    assert_eq!(out.national_final[&pid("B")], 6);
    assert_eq!(out.districts.iter().map(|d| d.final_seats.values().sum::<u32>()).sum::<u32>(), 10);

    // 180 ballots over 4 planned seats.
    assert_eq!(out.district(&did("D1")).unwrap().votes_per_seat, Some(45.0));
}

#[test]
fn identical_inputs_give_identical_outcomes() {
    let input = three_districts(&[("D1", 400.0), ("D2", 300.0), ("D3", 300.0)]);
    let params = Params { total_seats: 10, ..Params::default() };
    assert_eq!(run(&input, &params).unwrap(), run(&input, &params).unwrap());
}

fn small_party_input() -> ElectionInput {
    ElectionInput {
        votes: votes(&[
            ("D1", "A", 1000),
            ("D1", "B", 900),
            ("D2", "C", 60),
            ("D2", "A", 50),
        ]),
        districts: districts(&[("D1", 300.0), ("D2", 100.0)]),
        adjustments: Adjustments::default(),
    }
}

#[test]
fn hard_threshold_removes_small_party_everywhere() {
    let input = small_party_input();
    let soft = Params { total_seats: 4, leveling_seats_per_district: 0, ..Params::default() };
    let out = run(&input, &soft).unwrap();
    assert_eq!(out.district(&did("D2")).unwrap().direct_seats[&pid("C")], 1);
    assert_eq!(
        out.leveling.standing(&pid("C")).unwrap().status,
        Standing::BelowThreshold
    );

    let hard = Params { hard_threshold: true, ..soft };
    let out = run(&input, &hard).unwrap();
    assert_eq!(out.hard_excluded, vec![pid("C")]);
    let d2 = out.district(&did("D2")).unwrap();
    assert!(!d2.direct_seats.contains_key(&pid("C")));
    assert_eq!(d2.direct_seats[&pid("A")], 1);
    // Excluded votes still count towards the district statistics.
    assert_eq!(d2.valid_votes, 110);
}

#[test]
fn blank_votes_stay_out_of_competition() {
    let mut input = small_party_input();
    input.votes.rows.push(VoteRow { district: did("D1"), party: pid("BLANKE"), votes: 500 });
    let params = Params { total_seats: 4, leveling_seats_per_district: 0, ..Params::default() };
    let out = run(&input, &params).unwrap();
    assert_eq!(out.blank_votes, 500);
    assert_eq!(out.valid_votes, 2010);
    assert!(out.leveling.standing(&pid("BLANKE")).is_none());
    let d1 = out.district(&did("D1")).unwrap();
    assert_eq!((d1.blank_votes, d1.votes_cast), (500, 2400));
    // Blank ballots count towards votes per seat: 2400 over 3 planned seats.
    assert_eq!(d1.votes_per_seat, Some(800.0));
}

#[test]
fn adjustments_must_reference_known_districts() {
    let mut input = small_party_input();
    input.adjustments.add.push(VoteAddition { district: did("D7"), party: pid("A"), votes: 5 });
    let params = Params { total_seats: 4, leveling_seats_per_district: 0, ..Params::default() };
    let err = run(&input, &params).unwrap_err();
    assert!(matches!(err, PipelineError::Data(DataError::UnknownDistrict { .. })));
}

#[test]
fn adjustments_change_the_outcome() {
    let mut input = small_party_input();
    input.adjustments.add.push(VoteAddition { district: did("D2"), party: pid("A"), votes: 20 });
    let params = Params { total_seats: 4, leveling_seats_per_district: 0, ..Params::default() };
    let out = run(&input, &params).unwrap();
    assert_eq!(out.district(&did("D2")).unwrap().direct_seats[&pid("A")], 1);
}

#[test]
fn guaranteed_minimum_plan_feeds_districts() {
    let input = small_party_input();
    let params = Params {
        total_seats: 8,
        leveling_seats_per_district: 0,
        seat_plan: SeatPlanKind::GuaranteedMinimum,
        ..Params::default()
    };
    let out = run(&input, &params).unwrap();
    // 4 apportioned seats with a floor of 1, then 2 flat seats each.
    assert!(out.districts.iter().all(|d| d.planned_seats >= 3));
    assert_eq!(out.plan.iter().map(|(_, s)| s).sum::<u32>(), 8);
}

#[test]
fn district_too_small_for_its_leveling_seat_is_fatal() {
    let input = small_party_input();
    let params = Params { total_seats: 1, leveling_seats_per_district: 1, ..Params::default() };
    let err = run(&input, &params).unwrap_err();
    assert!(matches!(err, PipelineError::Allocate(_)));
}

#[test]
fn manifest_inputs_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, body: &str| std::fs::write(dir.path().join(name), body).unwrap();
    write(
        "votes.json",
        r#"{"rows":[
            {"district":"D1","party":"A","votes":100},{"district":"D1","party":"B","votes":80},
            {"district":"D2","party":"A","votes":40},{"district":"D2","party":"B","votes":60},
            {"district":"D3","party":"A","votes":10},{"district":"D3","party":"B","votes":50}]}"#,
    );
    write(
        "districts.json",
        r#"{"districts":[{"id":"D1","population":400},{"id":"D2","population":300},{"id":"D3","population":300}]}"#,
    );
    write("params.json", r#"{"total_seats":10}"#);
    write(
        "manifest.json",
        r#"{"votes_path":"votes.json","districts_path":"districts.json","params_path":"params.json"}"#,
    );

    let ctx = load_all_from_manifest(&dir.path().join("manifest.json")).unwrap();
    let out = run(&ctx.input, &ctx.params).unwrap();
    assert_eq!(out.placement.awards.len(), 3);
}

#[test]
fn leveling_seats_are_placed_by_the_district_divisor() {
    // D'Hondt direct seats, modified Sainte-Laguë nationally. Plan {4,4}, pools {3,3}.
    // Direct: D1 X3; D2 C2 X1. Entitlement X5 C3, one leveling seat each.
    let input = ElectionInput {
        votes: votes(&[("D1", "X", 160), ("D1", "C", 40), ("D2", "C", 70), ("D2", "X", 30)]),
        districts: districts(&[("D1", 400.0), ("D2", 400.0)]),
        adjustments: Adjustments::default(),
    };
    let params = Params {
        total_seats: 8,
        district_method: MethodKind::DHondt,
        first_divisor: 1.0,
        ..Params::default()
    };
    let out = run(&input, &params).unwrap();

    // Rest quotients with k+1: D2 C 70/3 beats D1 C 40/1 relative to each pool,
    // so C is placed in D2 and X takes D1. Divisor 2k+1 would swap them.
    assert_eq!(out.placement.awards[&did("D2")], pid("C"));
    assert_eq!(out.placement.awards[&did("D1")], pid("X"));
    let d1 = out.district(&did("D1")).unwrap();
    let d2 = out.district(&did("D2")).unwrap();
    assert_eq!(d1.final_seats[&pid("X")], 4);
    assert_eq!((d2.final_seats[&pid("C")], d2.final_seats[&pid("X")]), (3, 1));
    assert_eq!((out.national_final[&pid("X")], out.national_final[&pid("C")]), (5, 3));
}

#[test]
fn merged_districts_are_planned_as_one() {
    let mut input = three_districts(&[("D1", 400.0), ("D2", 300.0), ("D3", 300.0)]);
    input.adjustments.merge.push(DistrictMerge { into: did("D23"), from: vec![did("D2"), did("D3")] });
    let params = Params { total_seats: 10, ..Params::default() };
    let out = run(&input, &params).unwrap();

    let ids: Vec<&str> = out.districts.iter().map(|d| d.district.as_str()).collect();
    assert_eq!(ids, vec!["D1", "D23"]);
    let d23 = out.district(&did("D23")).unwrap();
    assert_eq!(d23.votes, vec![(pid("A"), 50), (pid("B"), 110)]);
    let planned: Vec<u32> = out.plan.iter().map(|(_, seats)| seats).collect();
    assert_eq!(planned, vec![4, 6]);
}

fn with_electorate() -> ElectionInput {
    let mut input = ElectionInput {
        votes: votes(&[("D1", "A", 60), ("D1", "B", 20), ("D2", "A", 30), ("D2", "B", 50)]),
        districts: districts(&[("D1", 100.0), ("D2", 100.0)]),
        adjustments: Adjustments::default(),
    };
    input.districts.districts[0].eligible_voters = Some(160);
    input.districts.districts[1].eligible_voters = Some(100);
    input
}

#[test]
fn non_voters_compete_as_a_pseudo_party() {
    let params = Params {
        total_seats: 4,
        leveling_seats_per_district: 0,
        count_non_voters: true,
        ..Params::default()
    };
    let out = run(&with_electorate(), &params).unwrap();

    // D1: HJEM 80/1.4 leads A 60/1.4, then A 60/1.4 beats HJEM 80/3.
    let d1 = out.district(&did("D1")).unwrap();
    assert_eq!((d1.direct_seats[&pid("HJEM")], d1.direct_seats[&pid("A")]), (1, 1));
    assert_eq!(d1.non_voters, Some(80));
    assert_eq!(d1.participation_pct, Some(50.0));
    assert_eq!(d1.votes_per_seat, Some(40.0));

    assert_eq!(out.non_voters, Some(100));
    assert_eq!((out.votes_cast, out.valid_votes), (160, 260));
    assert_eq!(out.parties().last().map(|s| s.party.as_str()), Some("HJEM"));
}

#[test]
fn combined_non_voters_absorb_blank_ballots() {
    let mut input = with_electorate();
    input.votes.rows.push(VoteRow { district: did("D2"), party: pid("BLANKE"), votes: 10 });
    let params = Params {
        total_seats: 4,
        leveling_seats_per_district: 0,
        combine_blank_non_voters: true,
        ..Params::default()
    };
    let out = run(&input, &params).unwrap();

    let d2 = out.district(&did("D2")).unwrap();
    assert!(d2.votes.contains(&(pid("HJEM"), 20)));
    assert_eq!((d2.blank_votes, d2.non_voters), (10, Some(10)));
    assert_eq!(d2.blank_pct_of_eligible, Some(10.0));
    assert_eq!(d2.participation_pct, Some(90.0));
    assert_eq!(d2.votes_per_seat, Some(45.0));
    assert_eq!(out.blank_votes, 10);
}

#[test]
fn non_voters_need_an_electorate() {
    let mut input = with_electorate();
    input.districts.districts[1].eligible_voters = None;
    let params = Params { total_seats: 4, count_non_voters: true, ..Params::default() };
    let err = run(&input, &params).unwrap_err();
    assert!(matches!(err, PipelineError::Data(DataError::MissingEligibleVoters(d)) if d == did("D2")));
}
