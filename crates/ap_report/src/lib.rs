//! ap_report: pure offline report model + JSON renderers.
//!
//! Determinism rules:
//! - No I/O here. Callers hand over an already computed `ElectionOutcome`.
//! - Percentages and ratios are pre-formatted strings with fixed decimals.
//! - Stable section order; rows follow the outcome's table order.

#![forbid(unsafe_code)]

use ap_io::IoError;
use thiserror::Error;

pub mod render_json;
pub mod structure;

pub use render_json::{render_canonical, render_pretty};
pub use structure::{build_model, ReportModel};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("cannot serialize report: {0}")]
    Serialize(String),
}
