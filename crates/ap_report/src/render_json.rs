//! Report JSON renderers.
//!
//! - `render_canonical`: sorted keys, compact, no trailing newline. These are
//!   the bytes written to `result.json` and the bytes the `RES:` id covers.
//! - `render_pretty`: human-oriented, section order follows the model.

use ap_io::canonical_json::to_canonical_bytes_of;

use crate::{ReportError, ReportModel};

pub fn render_canonical(model: &ReportModel) -> Result<Vec<u8>, ReportError> {
    Ok(to_canonical_bytes_of(model)?)
}

pub fn render_pretty(model: &ReportModel) -> Result<String, ReportError> {
    let mut s =
        serde_json::to_string_pretty(model).map_err(|e| ReportError::Serialize(e.to_string()))?;
    s.push('\n');
    Ok(s)
}
