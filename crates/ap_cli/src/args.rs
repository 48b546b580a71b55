//! Argument surface for `apportion`.
//!
//! - Exactly one of: `--manifest` XOR (`--votes` + `--districts`, with
//!   optional `--params` / `--adjustments`).
//! - No networked paths (any `scheme://` is rejected).
//! - `--validate-only` loads and checks inputs without running the engine.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use thiserror::Error;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "apportion",
    version,
    disable_help_subcommand = true,
    about = "Two-tier seat apportionment with leveling seats (offline, deterministic)"
)]
pub struct Args {
    /// Manifest JSON naming every input (mutually exclusive with explicit file flags).
    #[arg(long, conflicts_with_all = ["votes", "districts", "params", "adjustments"])]
    pub manifest: Option<PathBuf>,

    /// Vote table JSON.
    #[arg(long)]
    pub votes: Option<PathBuf>,
    /// District reference table JSON.
    #[arg(long)]
    pub districts: Option<PathBuf>,
    /// Parameter set JSON (defaults apply when omitted).
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Vote adjustments / party transfers JSON.
    #[arg(long)]
    pub adjustments: Option<PathBuf>,

    /// Output directory for `result.json`.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Indented JSON instead of canonical bytes.
    #[arg(long)]
    pub pretty: bool,

    /// Load and validate inputs, do not run the engine.
    #[arg(long)]
    pub validate_only: bool,

    /// Errors only; nothing on stdout.
    #[arg(long, short, conflicts_with = "verbose")]
    pub quiet: bool,
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Short, stable messages (scripts match on them).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("missing required flag: {0}")]
    Missing(&'static str),
    #[error("path must be a local file (no scheme): {0}")]
    NonLocalPath(String),
    #[error("file not found: {0}")]
    NotFound(String),
}

pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

/// Mode and filesystem checks on already parsed arguments.
pub fn validate(args: Args) -> Result<Args, CliError> {
    for p in all_paths(&args) {
        ensure_local_path(p)?;
    }

    if let Some(manifest) = &args.manifest {
        ensure_local_exists(manifest, "--manifest")?;
    } else {
        let votes = args.votes.as_ref().ok_or(CliError::Missing("--votes"))?;
        let districts = args.districts.as_ref().ok_or(CliError::Missing("--districts"))?;
        ensure_local_exists(votes, "--votes")?;
        ensure_local_exists(districts, "--districts")?;
        if let Some(p) = &args.params {
            ensure_local_exists(p, "--params")?;
        }
        if let Some(p) = &args.adjustments {
            ensure_local_exists(p, "--adjustments")?;
        }
    }
    Ok(args)
}

fn all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        args.manifest.as_deref(),
        args.votes.as_deref(),
        args.districts.as_deref(),
        args.params.as_deref(),
        args.adjustments.as_deref(),
        Some(args.out.as_path()),
    ]
    .into_iter()
    .flatten()
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(s) if ap_io::looks_like_url(s) => Err(CliError::NonLocalPath(s.to_owned())),
        _ => Ok(()),
    }
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    match fs::metadata(p) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(CliError::NotFound(format!("{label} {}", p.display()))),
    }
}
