//! Direct-seat allocation inside one district.
//!
//! A `Constituency` owns the district's competing vote list in first-appearance
//! order and hands it to the configured `Method`. Its direct-seat pool is the
//! planned district total minus the seats reserved for leveling.

use ap_core::ids::{DistrictId, PartyId};
use thiserror::Error;

use crate::allocation::{seat_pool, AllocError, Method, SeatMap};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstituencyError {
    #[error("party {party} has no votes recorded in district {district}")]
    UnknownParty { district: DistrictId, party: PartyId },
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constituency {
    district: DistrictId,
    total_seats: u32,
    leveling_seats: u32,
    direct_pool: u32,
    votes: Vec<(PartyId, u64)>,
}

impl Constituency {
    /// Fails with `NegativePool` when `leveling_seats > total_seats`.
    pub fn new(
        district: DistrictId,
        total_seats: u32,
        leveling_seats: u32,
    ) -> Result<Self, ConstituencyError> {
        let direct_pool = seat_pool(i64::from(total_seats) - i64::from(leveling_seats))?;
        Ok(Self { district, total_seats, leveling_seats, direct_pool, votes: Vec::new() })
    }

    /// Merge `votes` into `party` (summing), appending unseen parties at the end.
    pub fn add_votes(&mut self, party: &PartyId, votes: u64) {
        match self.votes.iter_mut().find(|(p, _)| p == party) {
            Some((_, v)) => *v = v.saturating_add(votes),
            None => self.votes.push((party.clone(), votes)),
        }
    }

    /// Overwrite an existing party's vote count.
    pub fn set_votes(&mut self, party: &PartyId, votes: u64) -> Result<(), ConstituencyError> {
        let ix = self.index_of(party)?;
        self.votes[ix].1 = votes;
        Ok(())
    }

    /// Remove a party from competition; returns the votes it held.
    pub fn remove_party(&mut self, party: &PartyId) -> Result<u64, ConstituencyError> {
        let ix = self.index_of(party)?;
        Ok(self.votes.remove(ix).1)
    }

    /// Allocate the direct-seat pool. Pure: repeated calls give the same map.
    pub fn calculate(&self, method: &Method) -> Result<SeatMap<PartyId>, ConstituencyError> {
        let entries: Vec<(PartyId, f64)> =
            self.votes.iter().map(|(p, v)| (p.clone(), *v as f64)).collect();
        Ok(method.allocate(self.direct_pool, &entries)?)
    }

    fn index_of(&self, party: &PartyId) -> Result<usize, ConstituencyError> {
        self.votes.iter().position(|(p, _)| p == party).ok_or_else(|| {
            ConstituencyError::UnknownParty { district: self.district.clone(), party: party.clone() }
        })
    }

    #[inline]
    pub fn district(&self) -> &DistrictId {
        &self.district
    }

    #[inline]
    pub fn total_seats(&self) -> u32 {
        self.total_seats
    }

    #[inline]
    pub fn leveling_seats(&self) -> u32 {
        self.leveling_seats
    }

    #[inline]
    pub fn direct_pool(&self) -> u32 {
        self.direct_pool
    }

    /// Competing parties and their votes, in first-appearance order.
    #[inline]
    pub fn votes(&self) -> &[(PartyId, u64)] {
        &self.votes
    }

    pub fn votes_of(&self, party: &PartyId) -> u64 {
        self.votes.iter().find(|(p, _)| p == party).map_or(0, |(_, v)| *v)
    }

    pub fn contains(&self, party: &PartyId) -> bool {
        self.votes.iter().any(|(p, _)| p == party)
    }

    /// Sum of the competing votes.
    pub fn valid_votes(&self) -> u64 {
        self.votes.iter().map(|(_, v)| *v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PartyId {
        s.parse().unwrap()
    }

    fn district(total: u32, leveling: u32) -> Constituency {
        Constituency::new("D1".parse().unwrap(), total, leveling).unwrap()
    }

    #[test]
    fn direct_pool_excludes_leveling() {
        let c = district(4, 1);
        assert_eq!(c.direct_pool(), 3);
        assert_eq!(c.total_seats(), 4);
        assert_eq!(c.leveling_seats(), 1);
    }

    #[test]
    fn negative_pool_is_rejected() {
        let err = Constituency::new("D1".parse().unwrap(), 1, 2).unwrap_err();
        assert_eq!(err, ConstituencyError::Alloc(AllocError::NegativePool(-1)));
    }

    #[test]
    fn add_votes_merges_and_keeps_order() {
        let mut c = district(3, 0);
        c.add_votes(&pid("B"), 10);
        c.add_votes(&pid("A"), 5);
        c.add_votes(&pid("B"), 7);
        assert_eq!(c.votes(), &[(pid("B"), 17), (pid("A"), 5)]);
        assert_eq!(c.valid_votes(), 22);
    }

    #[test]
    fn edits_require_known_party() {
        let mut c = district(3, 0);
        c.add_votes(&pid("A"), 5);
        c.set_votes(&pid("A"), 9).unwrap();
        assert_eq!(c.votes_of(&pid("A")), 9);
        assert!(matches!(
            c.set_votes(&pid("Z"), 1),
            Err(ConstituencyError::UnknownParty { .. })
        ));
        assert!(matches!(c.remove_party(&pid("Z")), Err(ConstituencyError::UnknownParty { .. })));
        assert_eq!(c.remove_party(&pid("A")).unwrap(), 9);
        assert!(!c.contains(&pid("A")));
    }

    #[test]
    fn first_district_of_three_district_scenario() {
        let mut c = district(3, 0);
        c.add_votes(&pid("A"), 100);
        c.add_votes(&pid("B"), 80);
        let m = Method::SainteLague { first_divisor: 1.4 };
        let out = c.calculate(&m).unwrap();
        assert_eq!(out[&pid("A")], 2);
        assert_eq!(out[&pid("B")], 1);
        assert_eq!(c.calculate(&m).unwrap(), out);
    }

    #[test]
    fn no_parties_gives_empty_map() {
        let c = district(2, 0);
        assert!(c.calculate(&Method::FirstPastThePost).unwrap().is_empty());
    }
}
