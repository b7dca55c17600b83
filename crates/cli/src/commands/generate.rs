use anyhow::{Context, Result};
use slngen_core::headers::SegmentMatcher;
use slngen_core::services::{Generator, JsonManifestEmitter};

use crate::commands::{meson_engine, open_context};
use crate::driver_command;

/// Generate (or regenerate) the solution manifest for a build directory.
pub fn generate_command(build_root: &str) -> Result<()> {
    let ctx = open_context(build_root)?;
    let engine = meson_engine(&ctx);
    let generator = Generator {
        ctx: &ctx,
        engine: &engine,
        matcher: &SegmentMatcher,
        driver: driver_command(&ctx.layout.root),
    };
    let emitter = JsonManifestEmitter::in_dir(&ctx.layout.root);

    let report = generator.generate(&emitter).with_context(|| {
        format!("Failed to generate solution for {}", ctx.layout.root.display())
    })?;

    let stats = &report.attribution;
    println!("Generated solution:");
    println!("  Name: {}", report.solution_name);
    println!("  Manifest: {}", report.output.display());
    println!("  Projects: {}", report.projects);
    println!("  Folders: {}", report.folders);
    println!(
        "  Objects: {} attributed, {} unattributed, {} ambiguous",
        stats.attributed, stats.unattributed, stats.ambiguous
    );
    println!("  Headers: {} kept, {} discarded", stats.headers_kept, stats.headers_discarded);

    Ok(())
}
