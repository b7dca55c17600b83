use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub mod commands;

/// Environment variable holding the log filter (e.g. `slngen=debug`).
pub const LOG_ENV_VAR: &str = "SLNGEN_LOG";

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Install the stderr tracing subscriber. Stdout stays reserved for command output.
///
/// Defaults to `warn` when `SLNGEN_LOG` is unset or unparsable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::WARN.into()));
    let _ =
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// The command generated steps use to call back into this binary.
///
/// Falls back to the bare program name when the running executable cannot be
/// located, which still works when `slngen` is on `PATH`.
pub fn driver_command(build_root: &Path) -> Vec<String> {
    let program = env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "slngen".to_string());
    vec![program, "--build-root".to_string(), build_root.display().to_string()]
}
