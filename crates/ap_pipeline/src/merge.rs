//! MERGE stage: fold old districts into merged districts before planning.
//!
//! - Population, area and eligible voters of the members are summed. Eligible
//!   voters stay unknown if any member lacks them.
//! - Vote rows and vote additions naming a member are relabelled to the target.
//! - The merged district takes the table position of its first member.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use ap_core::ids::DistrictId;
use ap_io::loader::{
    Adjustments, DistrictRow, DistrictTable, ElectionInput, VoteAddition, VoteRow, VoteTable,
};
use tracing::info;

use crate::DataError;

pub fn apply(input: &ElectionInput) -> Result<Cow<'_, ElectionInput>, DataError> {
    if input.adjustments.merge.is_empty() {
        return Ok(Cow::Borrowed(input));
    }

    let known: BTreeSet<&DistrictId> = input.districts.districts.iter().map(|r| &r.id).collect();
    let mut target_of: BTreeMap<&DistrictId, &DistrictId> = BTreeMap::new();
    for m in &input.adjustments.merge {
        for d in &m.from {
            if !known.contains(d) {
                return Err(DataError::UnknownDistrict { district: d.clone(), context: "district merge" });
            }
            target_of.insert(d, &m.into);
        }
    }
    for m in &input.adjustments.merge {
        if known.contains(&m.into) && !target_of.contains_key(&m.into) {
            return Err(DataError::MergeCollision(m.into.clone()));
        }
    }
    let relabel = |d: &DistrictId| -> DistrictId {
        target_of.get(d).map_or_else(|| d.clone(), |t| (*t).clone())
    };

    let mut rows: Vec<DistrictRow> = Vec::new();
    let mut slot: BTreeMap<DistrictId, usize> = BTreeMap::new();
    for row in &input.districts.districts {
        let id = relabel(&row.id);
        match slot.get(&id) {
            Some(&ix) => {
                let merged = &mut rows[ix];
                merged.population += row.population;
                merged.area += row.area;
                merged.eligible_voters = match (merged.eligible_voters, row.eligible_voters) {
                    (Some(a), Some(b)) => Some(a + b),
                    _ => None,
                };
            }
            None => {
                slot.insert(id.clone(), rows.len());
                rows.push(DistrictRow { id, ..row.clone() });
            }
        }
    }

    let votes = input
        .votes
        .rows
        .iter()
        .map(|r| VoteRow { district: relabel(&r.district), ..r.clone() })
        .collect();
    let add = input
        .adjustments
        .add
        .iter()
        .map(|a| VoteAddition { district: relabel(&a.district), ..a.clone() })
        .collect();

    info!(before = input.districts.districts.len(), after = rows.len(), "districts merged");
    Ok(Cow::Owned(ElectionInput {
        votes: VoteTable { rows: votes },
        districts: DistrictTable { districts: rows },
        adjustments: Adjustments {
            add,
            transfers: input.adjustments.transfers.clone(),
            merge: Vec::new(),
        },
    }))
}
