//! ap_io: local JSON I/O for the apportionment engine.
//!
//! - Loaders for the vote table, district reference table, adjustments and
//!   parameter set, plus manifest resolution (offline paths only).
//! - Canonical JSON (sorted keys, compact) and SHA-256 helpers used to derive
//!   stable result ids.
//! - Shared error type (`IoError`); details live in submodules.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use ap_core::CoreError;
use thiserror::Error;

/// Unified error for ap_io.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse/serialize failure; `context` names the artifact.
    #[error("json error in {context}: {msg}")]
    Json { context: String, msg: String },

    /// Manifest path problems (URL, missing file, directory).
    #[error("path error: {0}")]
    Path(String),

    /// Shape / cross-reference violations in otherwise well-formed JSON.
    #[error("invalid: {0}")]
    Invalid(String),

    #[error("parameter set: {0}")]
    Params(#[from] CoreError),
}

pub type IoResult<T> = Result<T, IoError>;

impl IoError {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        IoError::Read { path: path.to_path_buf(), source }
    }

    pub(crate) fn json(context: impl Into<String>, e: serde_json::Error) -> Self {
        IoError::Json { context: context.into(), msg: e.to_string() }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod manifest;

/// Returns true if `s` looks like a URL (any `<scheme>://`, plus bare http/https).
#[inline]
pub fn looks_like_url(s: &str) -> bool {
    let s = s.trim();
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

pub mod prelude {
    pub use crate::canonical_json::{to_canonical_bytes, write_atomic};
    pub use crate::hasher::{res_id_from_canonical, sha256_canonical, sha256_hex};
    pub use crate::loader::{
        load_all_from_manifest, load_from_paths, Adjustments, DistrictMerge, DistrictRow,
        DistrictTable, ElectionInput, InputDigests, InputPaths, LoadedContext, Transfer,
        VoteAddition, VoteRow, VoteTable,
    };
    pub use crate::{IoError, IoResult};
}
