use std::path::{Path, PathBuf};

use crate::services::emit::manifest_file_name;

/// Logical layout of a configured build directory.
///
/// This is derived from the build root. It does *not* perform any IO itself.
#[derive(Debug, Clone)]
pub struct BuildLayout {
    /// Root of the build directory.
    pub root: PathBuf,
    /// Introspection documents (meson-info).
    pub info_dir: PathBuf,
    /// Ninja build file, used to discover the configure command.
    pub build_ninja: PathBuf,
    /// Directory for generator state (.slngen).
    pub meta_dir: PathBuf,
    /// Default coordination scratch directory (.slngen/markers).
    pub scratch_dir: PathBuf,
    /// Candidate config files, in lookup order.
    pub config_candidates: Vec<PathBuf>,
}

impl BuildLayout {
    /// Compute the layout for a build directory rooted at `root`.
    ///
    /// This does *not* touch the filesystem.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let info_dir = root.join("meson-info");
        let build_ninja = root.join("build.ninja");
        let meta_dir = root.join(".slngen");
        let scratch_dir = meta_dir.join("markers");
        let config_candidates =
            ["slngen.yaml", "slngen.yml", "slngen.json"].iter().map(|n| root.join(n)).collect();

        Self { root, info_dir, build_ninja, meta_dir, scratch_dir, config_candidates }
    }

    /// Scratch directory honoring a configured override (relative to the root).
    pub fn scratch_dir_for(&self, configured: Option<&str>) -> PathBuf {
        match configured {
            Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
            Some(dir) => self.root.join(dir),
            None => self.scratch_dir.clone(),
        }
    }

    /// Where the graph manifest for `solution_name` is written.
    pub fn manifest_path(&self, solution_name: &str) -> PathBuf {
        self.root.join(manifest_file_name(solution_name))
    }
}
