//! Placement of national leveling seats into districts.
//!
//! Contract:
//! - Every (eligible district, party with leveling seats) pair gets a rest
//!   quotient `(v / d(k)) / (V / P)`: `v` the party's votes in the district,
//!   `d(k)` the district method's rest divisor after the party's `k` direct
//!   seats there (`k+1` for D'Hondt, `2k+1` otherwise), `V` the district's
//!   valid votes and `P` its direct-seat pool. Districts with no valid votes
//!   or no direct pool rank at zero.
//! - Quotients are integer fractions compared by cross-multiplication. Rows
//!   are sorted descending with a stable sort, so equal quotients keep table
//!   order (district order, then party order).
//! - Walking the ranking, a row is skipped if its district was already awarded
//!   or its party is exhausted. Each district takes at most one award.
//! - Seats that find no district are reported as unplaced, never dropped.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use ap_core::ids::{DistrictId, PartyId};
use thiserror::Error;

use crate::allocation::{Method, SeatMap};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("district {0} appears more than once")]
    DuplicateDistrict(DistrictId),
    #[error("party {0} listed more than once for leveling")]
    DuplicateParty(PartyId),
}

/// District state as seen by the distributor. `seats` starts as the direct
/// award and receives the leveling seat when one is placed here.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictLedger {
    pub district: DistrictId,
    pub direct_pool: u32,
    pub leveling_seats: u32,
    pub valid_votes: u64,
    pub votes: Vec<(PartyId, u64)>,
    pub seats: SeatMap<PartyId>,
}

impl DistrictLedger {
    fn votes_of(&self, party: &PartyId) -> u64 {
        self.votes.iter().find(|(p, _)| p == party).map_or(0, |(_, v)| *v)
    }

    fn seats_of(&self, party: &PartyId) -> u32 {
        self.seats.get(party).copied().unwrap_or(0)
    }
}

/// Rest quotient `num / den` with `den > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestQuotient {
    pub num: u128,
    pub den: u128,
}

impl RestQuotient {
    pub const ZERO: Self = Self { num: 0, den: 1 };

    /// Approximate value (reporting only).
    pub fn value(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Exact order; falls back to `f64` only if a cross product overflows.
    pub fn cmp_exact(&self, other: &Self) -> Ordering {
        match (self.num.checked_mul(other.den), other.num.checked_mul(self.den)) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => self.value().total_cmp(&other.value()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuotientRow {
    pub district: DistrictId,
    pub party: PartyId,
    pub quotient: RestQuotient,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlacementOutcome {
    /// District → party holding its leveling seat.
    pub awards: BTreeMap<DistrictId, PartyId>,
    /// Full ranking, best first.
    pub ranking: Vec<QuotientRow>,
    /// Party → leveling seats that found no district.
    pub unplaced: BTreeMap<PartyId, u32>,
}

impl PlacementOutcome {
    pub fn awarded_to(&self, party: &PartyId) -> u32 {
        self.awards.values().filter(|p| *p == party).count() as u32
    }
}

/// Rest quotient of `party` in `ledger`: `v·P / (d(k)·V)`.
fn rest_quotient(ledger: &DistrictLedger, party: &PartyId, method: &Method) -> RestQuotient {
    let votes = ledger.votes_of(party);
    if ledger.valid_votes == 0 || ledger.direct_pool == 0 || votes == 0 {
        return RestQuotient::ZERO;
    }
    let divisor = method.rest_divisor(ledger.seats_of(party));
    RestQuotient {
        num: u128::from(votes) * u128::from(ledger.direct_pool),
        den: divisor.saturating_mul(u128::from(ledger.valid_votes)),
    }
}

/// Place `leveling` (party → seats to place, table order) into `ledgers`.
pub fn place_leveling_seats(
    ledgers: &mut [DistrictLedger],
    leveling: &[(PartyId, u32)],
    method: &Method,
) -> Result<PlacementOutcome, PlacementError> {
    check_unique(ledgers, leveling)?;

    let wanted: Vec<&(PartyId, u32)> = leveling.iter().filter(|(_, n)| *n > 0).collect();

    let mut ranking: Vec<QuotientRow> = Vec::new();
    for ledger in ledgers.iter().filter(|l| l.leveling_seats >= 1) {
        for (party, _) in &wanted {
            ranking.push(QuotientRow {
                district: ledger.district.clone(),
                party: party.clone(),
                quotient: rest_quotient(ledger, party, method),
            });
        }
    }
    ranking.sort_by(|a, b| b.quotient.cmp_exact(&a.quotient));

    let quota: BTreeMap<&PartyId, u32> = wanted.iter().map(|(p, n)| (p, *n)).collect();
    let mut placed: BTreeMap<&PartyId, u32> = BTreeMap::new();
    let mut awards: BTreeMap<DistrictId, PartyId> = BTreeMap::new();
    let mut open_parties = wanted.len();

    for row in &ranking {
        if open_parties == 0 {
            break;
        }
        if awards.contains_key(&row.district) {
            continue;
        }
        let limit = quota.get(&row.party).copied().unwrap_or(0);
        let count = placed.entry(&row.party).or_insert(0);
        if *count >= limit {
            continue;
        }
        *count += 1;
        if *count == limit {
            open_parties -= 1;
        }
        awards.insert(row.district.clone(), row.party.clone());
    }

    for ledger in ledgers.iter_mut() {
        if let Some(party) = awards.get(&ledger.district) {
            *ledger.seats.entry(party.clone()).or_insert(0) += 1;
        }
    }

    let unplaced = wanted
        .iter()
        .filter_map(|(p, n)| {
            let got = placed.get(p).copied().unwrap_or(0);
            (got < *n).then(|| (p.clone(), n - got))
        })
        .collect();

    Ok(PlacementOutcome { awards, ranking, unplaced })
}

fn check_unique(ledgers: &[DistrictLedger], leveling: &[(PartyId, u32)]) -> Result<(), PlacementError> {
    let mut districts = BTreeSet::new();
    for l in ledgers {
        if !districts.insert(&l.district) {
            return Err(PlacementError::DuplicateDistrict(l.district.clone()));
        }
    }
    let mut parties = BTreeSet::new();
    for (p, _) in leveling {
        if !parties.insert(p) {
            return Err(PlacementError::DuplicateParty(p.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PartyId {
        s.parse().unwrap()
    }

    fn did(s: &str) -> DistrictId {
        s.parse().unwrap()
    }

    fn ledger(id: &str, pool: u32, votes: &[(&str, u64)], direct: &[(&str, u32)]) -> DistrictLedger {
        let votes: Vec<(PartyId, u64)> = votes.iter().map(|(p, v)| (pid(p), *v)).collect();
        DistrictLedger {
            district: did(id),
            direct_pool: pool,
            leveling_seats: 1,
            valid_votes: votes.iter().map(|(_, v)| v).sum(),
            votes,
            seats: direct.iter().map(|(p, s)| (pid(p), *s)).collect(),
        }
    }

    fn sl() -> Method {
        Method::SainteLague { first_divisor: 1.4 }
    }

    #[test]
    fn highest_rest_quotient_wins_each_district() {
        let mut ledgers = vec![
            ledger("D1", 2, &[("A", 60), ("B", 40)], &[("A", 1), ("B", 1)]),
            ledger("D2", 2, &[("A", 30), ("B", 70)], &[("A", 1), ("B", 1)]),
        ];
        // Quotients: D2/B 0.467, D1/A 0.4, D1/B 0.267, D2/A 0.2.
        let out = place_leveling_seats(&mut ledgers, &[(pid("A"), 1), (pid("B"), 1)], &sl()).unwrap();
        assert_eq!(out.awards[&did("D2")], pid("B"));
        assert_eq!(out.awards[&did("D1")], pid("A"));
        assert_eq!(out.ranking[0].district, did("D2"));
        assert!(out.unplaced.is_empty());
        assert_eq!(ledgers[0].seats[&pid("A")], 2);
        assert_eq!(ledgers[1].seats[&pid("B")], 2);
    }

    #[test]
    fn one_award_per_district_and_leftovers_reported() {
        let mut ledgers = vec![ledger("D1", 2, &[("C", 50), ("A", 50)], &[("A", 2)])];
        let out = place_leveling_seats(&mut ledgers, &[(pid("C"), 2)], &sl()).unwrap();
        assert_eq!(out.awards.len(), 1);
        assert_eq!(out.awarded_to(&pid("C")), 1);
        assert_eq!(out.unplaced[&pid("C")], 1);
    }

    #[test]
    fn districts_without_reserved_seats_are_skipped() {
        let mut a = ledger("D1", 2, &[("C", 90)], &[]);
        a.leveling_seats = 0;
        let b = ledger("D2", 2, &[("C", 10)], &[]);
        let mut ledgers = vec![a, b];
        let out = place_leveling_seats(&mut ledgers, &[(pid("C"), 1)], &sl()).unwrap();
        assert_eq!(out.awards.keys().collect::<Vec<_>>(), vec![&did("D2")]);
    }

    #[test]
    fn equal_quotients_follow_table_order() {
        let mut ledgers = vec![
            ledger("Z", 1, &[("C", 10)], &[]),
            ledger("A", 1, &[("C", 10)], &[]),
        ];
        let out = place_leveling_seats(&mut ledgers, &[(pid("C"), 1)], &sl()).unwrap();
        assert_eq!(out.awards[&did("Z")], pid("C"));
        assert!(!out.awards.contains_key(&did("A")));
    }

    #[test]
    fn empty_district_ranks_at_zero() {
        let mut ledgers = vec![ledger("D1", 2, &[], &[])];
        let out = place_leveling_seats(&mut ledgers, &[(pid("C"), 1)], &sl()).unwrap();
        assert_eq!(out.ranking[0].quotient, RestQuotient::ZERO);
        assert_eq!(out.awards[&did("D1")], pid("C"));
    }

    #[test]
    fn rest_divisor_follows_district_method() {
        // C: D1 20 votes, no seats → 20·3/(1·100) = 0.6 under either method.
        //    D2 70 votes, 2 seats → 70·3/(5·100) = 0.42 (2k+1), 70·3/(3·100) = 0.7 (k+1).
        let ledgers = || {
            vec![
                ledger("D1", 3, &[("X", 80), ("C", 20)], &[("X", 3)]),
                ledger("D2", 3, &[("C", 70), ("X", 30)], &[("C", 2), ("X", 1)]),
            ]
        };
        let mut l = ledgers();
        let out = place_leveling_seats(&mut l, &[(pid("C"), 1)], &sl()).unwrap();
        assert_eq!(out.awards[&did("D1")], pid("C"));

        let mut l = ledgers();
        let dh = Method::DHondt { first_divisor: 1.0 };
        let out = place_leveling_seats(&mut l, &[(pid("C"), 1)], &dh).unwrap();
        assert_eq!(out.awards[&did("D2")], pid("C"));
        assert!(!out.awards.contains_key(&did("D1")));
    }

    #[test]
    fn equal_quotients_compare_exactly() {
        // D1: 30·2/(3·60) = 1/3 and D2: 10·1/(1·30) = 1/3 are the same fraction.
        let mut ledgers = vec![
            ledger("D1", 2, &[("C", 30), ("X", 30)], &[("C", 1), ("X", 1)]),
            ledger("D2", 1, &[("C", 10), ("X", 20)], &[("X", 1)]),
        ];
        let out = place_leveling_seats(&mut ledgers, &[(pid("C"), 1)], &sl()).unwrap();
        assert_eq!(out.ranking[0].quotient.cmp_exact(&out.ranking[1].quotient), Ordering::Equal);
        assert_eq!(out.awards[&did("D1")], pid("C"));
    }

    #[test]
    fn duplicate_inputs_rejected() {
        let mut ledgers = vec![ledger("D1", 2, &[], &[]), ledger("D1", 2, &[], &[])];
        assert_eq!(
            place_leveling_seats(&mut ledgers, &[], &sl()).unwrap_err(),
            PlacementError::DuplicateDistrict(did("D1"))
        );
    }
}
