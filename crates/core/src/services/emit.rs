use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::graph::SolutionGraph;
use crate::headers::AttributionStats;
use crate::identity::NodeId;
use crate::model::BuildOption;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Failed to serialize solution manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything an emitter needs to write the IDE files for one solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionManifest {
    pub solution_name: String,
    /// Random per run; lets consumers tell regenerations apart.
    pub generation_id: NodeId,
    pub build_type: String,
    pub platform: String,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// The `slngen` invocation steps call back into (program and leading args).
    pub driver: Vec<String>,
    pub build_options: Vec<BuildOption>,
    pub attribution: AttributionStats,
    pub graph: SolutionGraph,
}

/// Serializes an assembled graph into IDE-consumable files.
pub trait GraphEmitter {
    /// Write the manifest and return the primary file written.
    fn emit(&self, manifest: &SolutionManifest) -> Result<PathBuf, EmitError>;
}

/// File name of the manifest for `solution_name`.
pub fn manifest_file_name(solution_name: &str) -> String {
    format!("{solution_name}.slngen.json")
}

/// Writes `<dir>/<solution name>.slngen.json` as pretty JSON, atomically
/// (temp file then rename), so a failed run never leaves a truncated manifest.
#[derive(Debug, Clone)]
pub struct JsonManifestEmitter {
    dir: PathBuf,
}

impl JsonManifestEmitter {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl GraphEmitter for JsonManifestEmitter {
    fn emit(&self, manifest: &SolutionManifest) -> Result<PathBuf, EmitError> {
        let path = self.dir.join(manifest_file_name(&manifest.solution_name));
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(manifest)?;

        fs::write(&tmp, body).map_err(|source| EmitError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, &path).map_err(|source| EmitError::Io { path: path.clone(), source })?;

        info!(path = %path.display(), "wrote solution manifest");
        Ok(path)
    }
}

/// Read a manifest previously written by [`JsonManifestEmitter`].
pub fn read_manifest(path: &Path) -> Result<SolutionManifest, EmitError> {
    let body = fs::read_to_string(path)
        .map_err(|source| EmitError::Io { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_str(&body)?)
}
