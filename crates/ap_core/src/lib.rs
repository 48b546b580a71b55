//! ap_core: core tokens, method domains and parameters for the apportionment engine.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`ap_algo`, `ap_io`, `ap_pipeline`, `ap_report`, `ap_cli`).
//!
//! - Registry tokens: `PartyId`, `DistrictId`
//! - Method domains: `MethodKind`, `SeatPlanKind`
//! - Run configuration: `Params` with defaults and domain validation
//! - Deterministic ordering helpers (first-appearance table order)

#![forbid(unsafe_code)]

pub mod determinism;
pub mod ids;
pub mod variables;

pub mod errors {
    use thiserror::Error;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, Eq, PartialEq, Error)]
    pub enum CoreError {
        #[error("invalid token: {0:?}")]
        InvalidToken(String),
        #[error("unknown apportionment method: {0}")]
        UnknownMethod(String),
        #[error("domain out of range: {0}")]
        DomainOutOfRange(String),
    }
}

pub use errors::CoreError;
pub use ids::{DistrictId, PartyId};
pub use variables::{MethodKind, Params, SeatPlanKind};
