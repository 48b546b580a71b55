//! Run manifest: the set of input paths for one apportionment run.
//!
//! - Paths are relative to the manifest's directory unless absolute.
//! - Offline only: any path with a scheme is rejected.
//! - Required inputs must exist and be files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{looks_like_url, IoError};

/// External manifest accepted by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Optional free-form identifier (not used in any digest).
    #[serde(default)]
    pub id: Option<String>,
    pub votes_path: String,
    pub districts_path: String,
    pub params_path: String,
    #[serde(default)]
    pub adjustments_path: Option<String>,
}

/// Manifest paths resolved against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub votes: PathBuf,
    pub districts: PathBuf,
    pub params: PathBuf,
    pub adjustments: Option<PathBuf>,
}

pub fn load_manifest(path: &Path) -> Result<Manifest, IoError> {
    let text = fs::read_to_string(path).map_err(|e| IoError::read(path, e))?;
    let man: Manifest = serde_json::from_str(&text).map_err(|e| IoError::json("manifest", e))?;
    validate_manifest(&man)?;
    Ok(man)
}

fn validate_manifest(man: &Manifest) -> Result<(), IoError> {
    let mut fields = vec![
        ("votes_path", man.votes_path.as_str()),
        ("districts_path", man.districts_path.as_str()),
        ("params_path", man.params_path.as_str()),
    ];
    if let Some(adj) = &man.adjustments_path {
        fields.push(("adjustments_path", adj.as_str()));
    }
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(IoError::Path(format!("{name} must not be empty")));
        }
        if looks_like_url(value) {
            return Err(IoError::Path(format!("{name} must be a local path, got {value}")));
        }
    }
    Ok(())
}

fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn require_file(name: &str, p: PathBuf) -> Result<PathBuf, IoError> {
    let meta = fs::metadata(&p)
        .map_err(|e| IoError::Path(format!("{name}: cannot access {}: {e}", p.display())))?;
    if !meta.is_file() {
        return Err(IoError::Path(format!("{name}: not a file: {}", p.display())));
    }
    Ok(p)
}

/// Resolve `man` relative to the directory holding `manifest_path`.
pub fn resolve_paths(manifest_path: &Path, man: &Manifest) -> Result<ResolvedManifest, IoError> {
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(ResolvedManifest {
        votes: require_file("votes_path", join_under(base, &man.votes_path))?,
        districts: require_file("districts_path", join_under(base, &man.districts_path))?,
        params: require_file("params_path", join_under(base, &man.params_path))?,
        adjustments: man
            .adjustments_path
            .as_deref()
            .map(|p| require_file("adjustments_path", join_under(base, p)))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "v.json", "{}");
        write(dir.path(), "d.json", "{}");
        write(dir.path(), "p.json", "{}");
        let mp = write(
            dir.path(),
            "manifest.json",
            r#"{"votes_path":"v.json","districts_path":"d.json","params_path":"p.json"}"#,
        );
        let man = load_manifest(&mp).unwrap();
        let r = resolve_paths(&mp, &man).unwrap();
        assert_eq!(r.votes, dir.path().join("v.json"));
        assert!(r.adjustments.is_none());
    }

    #[test]
    fn rejects_urls_and_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mp = write(
            dir.path(),
            "m.json",
            r#"{"votes_path":"https://x/v.json","districts_path":"d","params_path":"p"}"#,
        );
        assert!(matches!(load_manifest(&mp), Err(IoError::Path(_))));

        let mp = write(
            dir.path(),
            "m2.json",
            r#"{"votes_path":"v","districts_path":"d","params_path":"p","extra":1}"#,
        );
        assert!(matches!(load_manifest(&mp), Err(IoError::Json { .. })));
    }

    #[test]
    fn missing_input_is_a_path_error() {
        let dir = tempfile::tempdir().unwrap();
        let mp = write(
            dir.path(),
            "m.json",
            r#"{"votes_path":"v","districts_path":"d","params_path":"p"}"#,
        );
        let man = load_manifest(&mp).unwrap();
        assert!(matches!(resolve_paths(&mp, &man), Err(IoError::Path(_))));
    }
}
