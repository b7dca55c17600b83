use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::layout::{load_generator_config, BuildLayout, GeneratorConfig};

/// Convenience wrapper bundling layout and resolved config for a build root.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub layout: BuildLayout,
    pub config: GeneratorConfig,
}

impl BuildContext {
    /// Load the generator config for a given build root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = BuildLayout::new(root);
        let config = load_generator_config(&layout)?;
        Ok(Self { layout, config })
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.layout.scratch_dir_for(self.config.scratch_dir.as_deref())
    }

    pub fn coordination_window(&self) -> Duration {
        Duration::from_millis(self.config.coordination_window_ms)
    }

    pub fn marker_ttl(&self) -> Option<Duration> {
        self.config.marker_ttl_secs.map(Duration::from_secs)
    }
}
