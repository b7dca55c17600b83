use std::path::PathBuf;

use anyhow::{Context, Result};
use slngen_core::coordination::{DirMarkerStore, Rendezvous, SystemClock};
use slngen_core::introspect::Introspection;
use slngen_core::layout::BuildContext;
use slngen_core::services::{resolve_meson_command, MesonEngine};

use crate::canonicalize_or_current;

/// Resolve `build_root` and load its generator config.
pub fn open_context(build_root: &str) -> Result<BuildContext> {
    let root = canonicalize_or_current(build_root)?;
    BuildContext::from_root(&root)
        .with_context(|| format!("Failed to load build context for {}", root.display()))
}

/// Engine adapter for a build directory, honoring `SLNGEN_MESON` and config.
pub fn meson_engine(ctx: &BuildContext) -> MesonEngine {
    let command = resolve_meson_command(ctx.config.meson.as_deref(), &ctx.layout.build_ninja);
    MesonEngine::new(command, &ctx.layout.root)
}

/// Marker rendezvous over the configured scratch directory.
pub fn rendezvous(ctx: &BuildContext) -> Rendezvous<DirMarkerStore, SystemClock> {
    Rendezvous::new(DirMarkerStore::new(ctx.scratch_dir()), SystemClock, ctx.coordination_window())
        .with_ttl(ctx.marker_ttl())
}

/// Name the solution gets: config override, else the project's descriptive name.
pub fn solution_name(ctx: &BuildContext) -> Result<String> {
    if let Some(name) = &ctx.config.solution_name {
        return Ok(name.clone());
    }
    let intro = Introspection::load(&ctx.layout.info_dir).with_context(|| {
        format!("Failed to read introspection in {}", ctx.layout.info_dir.display())
    })?;
    Ok(intro.project.descriptive_name)
}

/// Path of the manifest `generate` wrote for this build directory.
pub fn manifest_path(ctx: &BuildContext) -> Result<PathBuf> {
    Ok(ctx.layout.manifest_path(&solution_name(ctx)?))
}
