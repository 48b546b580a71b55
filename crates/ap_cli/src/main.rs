//! `apportion`: load inputs → run the pipeline → write `result.json`.

mod args;

mod exitcodes {
    pub const OK: u8 = 0;
    /// Bad flags, malformed or inconsistent inputs, invalid parameters.
    pub const VALIDATION: u8 = 2;
    /// Read/write failures.
    pub const IO: u8 = 4;
    /// The engine rejected the configuration while allocating seats.
    pub const ALLOCATION: u8 = 5;
}

use std::process::ExitCode;

use anyhow::{Context, Result};
use ap_io::{canonical_json::write_atomic, loader, IoError};
use ap_pipeline::PipelineError;
use ap_report::{build_model, render_canonical, render_pretty, ReportError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use args::Args;

fn main() -> ExitCode {
    let args = match args::parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("apportion: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION);
        }
    };
    init_tracing(&args);

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    match outcome {
        Ok(()) => ExitCode::from(exitcodes::OK),
        Err(e) => {
            eprintln!("apportion: error: {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn init_tracing(args: &Args) {
    let filter = match (args.quiet, args.verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 0) => EnvFilter::new("warn"),
        (false, 1) => EnvFilter::new("info"),
        (false, 2) => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &Args) -> Result<loader::LoadedContext> {
    let ctx = match &args.manifest {
        Some(manifest) => loader::load_all_from_manifest(manifest)
            .with_context(|| format!("loading manifest {}", manifest.display()))?,
        None => {
            let paths = loader::InputPaths {
                votes: args.votes.clone().context("--votes is required")?,
                districts: args.districts.clone().context("--districts is required")?,
                params: args.params.clone(),
                adjustments: args.adjustments.clone(),
            };
            loader::load_from_paths(&paths).context("loading inputs")?
        }
    };
    debug!(
        votes = %ctx.digests.votes_sha256,
        districts = %ctx.digests.districts_sha256,
        params = %ctx.digests.params_sha256,
        "inputs loaded"
    );
    Ok(ctx)
}

fn validate_only(args: &Args) -> Result<()> {
    let ctx = load(args)?;
    info!(
        rows = ctx.input.votes.rows.len(),
        districts = ctx.input.districts.districts.len(),
        "validate-only: inputs OK"
    );
    if !args.quiet {
        println!("inputs OK");
    }
    Ok(())
}

fn run_once(args: &Args) -> Result<()> {
    let ctx = load(args)?;
    let outcome = ap_pipeline::run(&ctx.input, &ctx.params).context("apportionment run")?;

    let model = build_model(&outcome, &ctx.params, Some(&ctx.digests))?;
    let bytes = if args.pretty { render_pretty(&model)?.into_bytes() } else { render_canonical(&model)? };

    let path = args.out.join("result.json");
    write_atomic(&path, &bytes)?;

    let id = model.id.as_deref().unwrap_or_default();
    info!(%id, path = %path.display(), "result written");
    if !args.quiet {
        println!("{id}");
    }
    Ok(())
}

/// Map the first typed error in the chain onto the exit-code table.
fn exit_code_for(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(io) = cause.downcast_ref::<IoError>() {
            return io_code(io);
        }
        if let Some(p) = cause.downcast_ref::<PipelineError>() {
            return match p {
                PipelineError::Config(_) | PipelineError::Data(_) => exitcodes::VALIDATION,
                _ => exitcodes::ALLOCATION,
            };
        }
        if let Some(r) = cause.downcast_ref::<ReportError>() {
            return match r {
                ReportError::Io(io) => io_code(io),
                ReportError::Serialize(_) => exitcodes::IO,
            };
        }
        if cause.downcast_ref::<ap_core::CoreError>().is_some() {
            return exitcodes::VALIDATION;
        }
    }
    exitcodes::IO
}

fn io_code(e: &IoError) -> u8 {
    match e {
        IoError::Read { .. } | IoError::Write { .. } => exitcodes::IO,
        IoError::Json { .. } | IoError::Path(_) | IoError::Invalid(_) | IoError::Params(_) => {
            exitcodes::VALIDATION
        }
    }
}
