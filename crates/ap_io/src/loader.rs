//! Loader: read local JSON inputs (manifest → votes → districts → params →
//! adjustments), check their shape, and return a typed `LoadedContext` for the
//! pipeline. No network I/O.
//!
//! Cross-references (a vote row naming a district missing from the reference
//! table, an adjustment for an unknown district) are data errors raised by the
//! pipeline, not here.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ap_core::ids::{DistrictId, PartyId};
use ap_core::variables::Params;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{hasher, manifest, IoError};

// ----------------------------- Wire-facing types -----------------------------

/// One line of the vote table. Duplicate (district, party) lines are summed later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRow {
    pub district: DistrictId,
    pub party: PartyId,
    pub votes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteTable {
    pub rows: Vec<VoteRow>,
}

/// Population/area reference for one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistrictRow {
    pub id: DistrictId,
    pub population: f64,
    #[serde(default)]
    pub area: f64,
    /// Registered voters; needed for participation figures and non-voter counting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_voters: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistrictTable {
    pub districts: Vec<DistrictRow>,
}

/// Extra votes credited to a party in one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteAddition {
    pub district: DistrictId,
    pub party: PartyId,
    pub votes: u64,
}

/// Every vote for `from` is counted for `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transfer {
    pub from: PartyId,
    pub to: PartyId,
}

/// Districts in `from` are counted as one district named `into`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistrictMerge {
    pub into: DistrictId,
    pub from: Vec<DistrictId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Adjustments {
    #[serde(default)]
    pub add: Vec<VoteAddition>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge: Vec<DistrictMerge>,
}

impl Adjustments {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.transfers.is_empty() && self.merge.is_empty()
    }
}

/// Everything the pipeline computes from, apart from `Params`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectionInput {
    pub votes: VoteTable,
    pub districts: DistrictTable,
    pub adjustments: Adjustments,
}

/// SHA-256 (canonical bytes) of every loaded input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigests {
    pub votes_sha256: String,
    pub districts_sha256: String,
    pub params_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustments_sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedContext {
    pub input: ElectionInput,
    pub params: Params,
    pub digests: InputDigests,
}

/// Explicit input locations (the CLI's non-manifest mode).
#[derive(Debug, Clone, Default)]
pub struct InputPaths {
    pub votes: PathBuf,
    pub districts: PathBuf,
    /// `None` runs with `Params::default()`.
    pub params: Option<PathBuf>,
    pub adjustments: Option<PathBuf>,
}

// ----------------------------- Orchestration -----------------------------

/// Load everything a manifest points at.
pub fn load_all_from_manifest(path: &Path) -> Result<LoadedContext, IoError> {
    let man = manifest::load_manifest(path)?;
    let resolved = manifest::resolve_paths(path, &man)?;
    load_from_paths(&InputPaths {
        votes: resolved.votes,
        districts: resolved.districts,
        params: Some(resolved.params),
        adjustments: resolved.adjustments,
    })
}

pub fn load_from_paths(paths: &InputPaths) -> Result<LoadedContext, IoError> {
    let votes = load_votes(&paths.votes)?;
    let districts = load_districts(&paths.districts)?;
    let params = match &paths.params {
        Some(p) => load_params(p)?,
        None => Params::default(),
    };
    let adjustments = match &paths.adjustments {
        Some(p) => Some(load_adjustments(p)?),
        None => None,
    };

    let digests = InputDigests {
        votes_sha256: hasher::sha256_canonical(&votes)?,
        districts_sha256: hasher::sha256_canonical(&districts)?,
        params_sha256: hasher::sha256_canonical(&params)?,
        adjustments_sha256: adjustments.as_ref().map(hasher::sha256_canonical).transpose()?,
    };

    Ok(LoadedContext {
        input: ElectionInput { votes, districts, adjustments: adjustments.unwrap_or_default() },
        params,
        digests,
    })
}

// ----------------------------- Individual loaders -----------------------------

fn read_json<T: DeserializeOwned>(path: &Path, context: &str) -> Result<T, IoError> {
    let text = fs::read_to_string(path).map_err(|e| IoError::read(path, e))?;
    serde_json::from_str(&text).map_err(|e| IoError::json(context, e))
}

pub fn load_votes(path: &Path) -> Result<VoteTable, IoError> {
    read_json(path, "vote table")
}

pub fn load_districts(path: &Path) -> Result<DistrictTable, IoError> {
    let table: DistrictTable = read_json(path, "district table")?;
    let mut seen = BTreeSet::new();
    for row in &table.districts {
        if !seen.insert(&row.id) {
            return Err(IoError::Invalid(format!("district {} listed more than once", row.id)));
        }
        if !row.population.is_finite() || row.population < 0.0 {
            return Err(IoError::Invalid(format!("district {}: bad population", row.id)));
        }
        if !row.area.is_finite() || row.area < 0.0 {
            return Err(IoError::Invalid(format!("district {}: bad area", row.id)));
        }
    }
    Ok(table)
}

/// Parse a parameter set and check its domains.
pub fn load_params(path: &Path) -> Result<Params, IoError> {
    let params: Params = read_json(path, "parameter set")?;
    params.validate_domains()?;
    Ok(params)
}

pub fn load_adjustments(path: &Path) -> Result<Adjustments, IoError> {
    let adj: Adjustments = read_json(path, "adjustments")?;
    for t in &adj.transfers {
        if t.from == t.to {
            return Err(IoError::Invalid(format!("transfer from {} to itself", t.from)));
        }
    }
    let mut targets = BTreeSet::new();
    let mut sources = BTreeSet::new();
    for m in &adj.merge {
        if m.from.is_empty() {
            return Err(IoError::Invalid(format!("merge into {} lists no districts", m.into)));
        }
        if !targets.insert(&m.into) {
            return Err(IoError::Invalid(format!("merge target {} listed more than once", m.into)));
        }
        for d in &m.from {
            if !sources.insert(d) {
                return Err(IoError::Invalid(format!("district {d} is merged more than once")));
            }
        }
    }
    Ok(adj)
}
