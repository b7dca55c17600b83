use anyhow::{Context, Result};
use slngen_core::services::steps::{
    run_build_all, run_direct_target, run_housekeeping, run_prebuild, run_target_step,
};
use slngen_core::services::{Housekeeping, StepOutcome};

use crate::commands::{meson_engine, open_context, rendezvous};

/// Solution prebuild: clear the coordination markers.
pub fn prebuild_command(build_root: &str) -> Result<()> {
    let ctx = open_context(build_root)?;
    let rendezvous = rendezvous(&ctx);
    run_prebuild(&rendezvous).context("Failed to clear coordination markers")?;
    println!("Cleared build markers in {}", ctx.scratch_dir().display());
    Ok(())
}

/// Single-target build step.
///
/// With `direct` the engine is invoked unconditionally (run targets);
/// otherwise the step joins the rendezvous and builds only when alone.
pub fn build_target_command(build_root: &str, target: &str, direct: bool) -> Result<()> {
    let ctx = open_context(build_root)?;
    let engine = meson_engine(&ctx);

    if direct {
        run_direct_target(&engine, target)
            .with_context(|| format!("Failed to run target {target}"))?;
        return Ok(());
    }

    let rendezvous = rendezvous(&ctx);
    match run_target_step(&rendezvous, &engine, target)
        .with_context(|| format!("Failed to build target {target}"))?
    {
        StepOutcome::Built => println!("Built {target}"),
        StepOutcome::Skipped { peers } => {
            println!("Skipped {target}: solution build in progress ({peers} other steps)")
        }
    }
    Ok(())
}

pub fn build_all_command(build_root: &str) -> Result<()> {
    let ctx = open_context(build_root)?;
    run_build_all(&rendezvous(&ctx), &meson_engine(&ctx))
        .context("Failed to build all targets")?;
    Ok(())
}

pub fn housekeeping_command(build_root: &str, step: Housekeeping) -> Result<()> {
    let ctx = open_context(build_root)?;
    run_housekeeping(&meson_engine(&ctx), step)
        .with_context(|| format!("Failed to run {step:?} step"))?;
    Ok(())
}
