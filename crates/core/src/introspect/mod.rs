//! Loading of Meson introspection documents (`<build>/meson-info/*.json`).
//!
//! Every document listed in [`INTROSPECTION_DOCUMENTS`] must exist; a missing
//! one aborts the run before anything else is read so the operator can re-run
//! the configure step.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{BuildOption, CompileSettings, ProjectInfo, SourceGroup, Target, TargetKind};

/// File names of all documents the generator requires, in load order.
pub const INTROSPECTION_DOCUMENTS: [&str; 9] = [
    "intro-benchmarks.json",
    "intro-buildoptions.json",
    "intro-buildsystem_files.json",
    "intro-dependencies.json",
    "intro-installed.json",
    "intro-projectinfo.json",
    "intro-targets.json",
    "intro-tests.json",
    "meson-info.json",
];

#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("Introspection document {document} missing at {path}; re-run the configure step")]
    Missing { document: String, path: PathBuf },

    #[error("Failed to read introspection document {document} at {path}: {source}")]
    Read {
        document: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse introspection document {document}: {source}")]
    Parse {
        document: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type IntrospectResult<T> = Result<T, IntrospectError>;

#[derive(Debug, Deserialize)]
struct RawMesonInfo {
    directories: RawDirectories,
}

#[derive(Debug, Deserialize)]
struct RawDirectories {
    source: PathBuf,
    build: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    name: String,
    id: String,
    #[serde(rename = "type")]
    target_type: String,
    defined_in: PathBuf,
    #[serde(default)]
    filename: Vec<PathBuf>,
    #[serde(default)]
    build_by_default: bool,
    #[serde(default)]
    target_sources: Vec<RawSourceGroup>,
    #[serde(default)]
    extra_files: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawSourceGroup {
    #[serde(default)]
    language: String,
    #[serde(default)]
    compiler: Vec<String>,
    #[serde(default)]
    parameters: Vec<String>,
    #[serde(default)]
    sources: Vec<PathBuf>,
    #[serde(default)]
    generated_sources: Vec<PathBuf>,
}

/// Parsed, validated introspection data for one build directory.
#[derive(Debug, Clone)]
pub struct Introspection {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub project: ProjectInfo,
    pub targets: Vec<Target>,
    pub build_options: Vec<BuildOption>,
    pub buildsystem_files: Vec<PathBuf>,
    pub test_count: usize,
    pub benchmark_count: usize,
}

impl Introspection {
    /// Load every required document from `info_dir` (usually `<build>/meson-info`).
    pub fn load(info_dir: &Path) -> IntrospectResult<Self> {
        // Presence first: nothing is parsed unless the whole set is there.
        for document in INTROSPECTION_DOCUMENTS {
            let path = info_dir.join(document);
            if !path.is_file() {
                return Err(IntrospectError::Missing { document: document.to_string(), path });
            }
        }

        let meson_info: RawMesonInfo = read_document(info_dir, "meson-info.json")?;
        let project: ProjectInfo = read_document(info_dir, "intro-projectinfo.json")?;
        let raw_targets: Vec<RawTarget> = read_document(info_dir, "intro-targets.json")?;
        let build_options: Vec<BuildOption> = read_document(info_dir, "intro-buildoptions.json")?;
        let buildsystem_files: Vec<PathBuf> =
            read_document(info_dir, "intro-buildsystem_files.json")?;
        let tests: Vec<serde_json::Value> = read_document(info_dir, "intro-tests.json")?;
        let benchmarks: Vec<serde_json::Value> =
            read_document(info_dir, "intro-benchmarks.json")?;
        // Only validated; nothing downstream consumes them.
        let _: serde_json::Value = read_document(info_dir, "intro-dependencies.json")?;
        let _: serde_json::Value = read_document(info_dir, "intro-installed.json")?;

        let source_dir = meson_info.directories.source;
        let targets: Vec<Target> =
            raw_targets.into_iter().map(|raw| convert_target(raw, &source_dir)).collect();

        info!(
            targets = targets.len(),
            options = build_options.len(),
            source_dir = %source_dir.display(),
            "loaded introspection data"
        );

        Ok(Self {
            source_dir,
            build_dir: meson_info.directories.build,
            project,
            targets,
            build_options,
            buildsystem_files,
            test_count: tests.len(),
            benchmark_count: benchmarks.len(),
        })
    }

    /// Value of the `buildtype` option, defaulting to `debug` like Meson does.
    pub fn build_type(&self) -> String {
        self.build_options
            .iter()
            .find(|opt| opt.name == "buildtype")
            .and_then(|opt| opt.value.as_str())
            .unwrap_or("debug")
            .to_string()
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}

fn read_document<T: DeserializeOwned>(info_dir: &Path, document: &str) -> IntrospectResult<T> {
    let path = info_dir.join(document);
    let body = fs::read_to_string(&path).map_err(|source| IntrospectError::Read {
        document: document.to_string(),
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&body)
        .map_err(|source| IntrospectError::Parse { document: document.to_string(), source })
}

fn convert_target(raw: RawTarget, source_dir: &Path) -> Target {
    // Engine ids are only unique per build directory layout, so qualify them
    // with the declaring directory to keep identities apart across subfolders.
    let identity = match raw.defined_in.parent().and_then(|d| d.strip_prefix(source_dir).ok()) {
        Some(prefix) => prefix.join(&raw.id),
        None => PathBuf::from(&raw.id),
    };
    debug!(target = %raw.name, identity = %identity.display(), "converted target");

    let source_groups = raw
        .target_sources
        .into_iter()
        .map(|group| SourceGroup {
            language: group.language,
            compiler: group.compiler,
            settings: CompileSettings::from_parameters(&group.parameters),
            sources: group.sources,
            generated_sources: group.generated_sources,
        })
        .collect();

    let output = match raw.filename.as_slice() {
        [single] => Some(single.clone()),
        _ => None,
    };

    Target {
        name: raw.name,
        id: raw.id,
        identity,
        kind: TargetKind::from_meson_type(&raw.target_type),
        source_groups,
        extra_files: raw.extra_files,
        output,
        build_by_default: raw.build_by_default,
        defined_in: raw.defined_in,
    }
}
