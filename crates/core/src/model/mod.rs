//! Core data model for build targets as described by Meson introspection.
//!
//! Everything here is produced by the `introspect` module at the start of a
//! generation run and treated as read-only afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Whether a target produces a compiled artifact or is a pseudo "run" target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "artifact")]
pub enum TargetKind {
    /// A compiled artifact. Carries the engine's type string
    /// (e.g. `executable`, `shared library`, `static library`).
    Compiled(String),
    /// A `run_target`: a command with no compiled output.
    Run,
}

impl TargetKind {
    /// Map the Meson `type` field onto a kind.
    pub fn from_meson_type(raw: &str) -> Self {
        match raw {
            "run" => TargetKind::Run,
            other => TargetKind::Compiled(other.to_string()),
        }
    }

    pub fn is_run(&self) -> bool {
        matches!(self, TargetKind::Run)
    }
}

/// Compiler settings split from a flat parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileSettings {
    pub include_paths: Vec<String>,
    pub definitions: Vec<String>,
    pub additional_options: Vec<String>,
}

impl CompileSettings {
    /// Split compiler parameters the way MSVC-style project formats want them:
    /// `-I`/`/I` become include paths, `-D`/`/D` definitions, and everything
    /// else is passed through untouched.
    pub fn from_parameters<S: AsRef<str>>(parameters: &[S]) -> Self {
        let mut settings = CompileSettings::default();
        for par in parameters {
            let par = par.as_ref();
            if let Some(rest) = par.strip_prefix("-I").or_else(|| par.strip_prefix("/I")) {
                settings.include_paths.push(rest.to_string());
            } else if let Some(rest) = par.strip_prefix("-D").or_else(|| par.strip_prefix("/D")) {
                settings.definitions.push(rest.to_string());
            } else {
                settings.additional_options.push(par.to_string());
            }
        }
        settings
    }

    /// Merge another group's settings, keeping first-seen order and skipping duplicates.
    pub fn merge(&mut self, other: &CompileSettings) {
        merge_unique(&mut self.include_paths, &other.include_paths);
        merge_unique(&mut self.definitions, &other.definitions);
        merge_unique(&mut self.additional_options, &other.additional_options);
    }
}

fn merge_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

/// One per-language group of sources and flags within a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    pub language: String,
    pub compiler: Vec<String>,
    pub sources: Vec<PathBuf>,
    pub generated_sources: Vec<PathBuf>,
    pub settings: CompileSettings,
}

impl SourceGroup {
    /// Regular and generated sources, in that order.
    pub fn all_sources(&self) -> impl Iterator<Item = &PathBuf> {
        self.sources.iter().chain(self.generated_sources.iter())
    }
}

/// A named, buildable unit from the introspection data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    /// Engine-assigned id (unique per build directory, not per subfolder).
    pub id: String,
    /// Directory-qualified identity: `<declaring dir relative to source root>/<id>`.
    pub identity: PathBuf,
    pub kind: TargetKind,
    pub source_groups: Vec<SourceGroup>,
    pub extra_files: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub build_by_default: bool,
    /// Absolute path of the build file that declared this target.
    pub defined_in: PathBuf,
}

impl Target {
    /// Directory of the declaring build file relative to `source_dir`.
    ///
    /// Returns an empty path for targets declared at the source root, and
    /// `None` when the declaring file lives outside the source tree.
    pub fn folder(&self, source_dir: &Path) -> Option<PathBuf> {
        let dir = self.defined_in.parent()?;
        dir.strip_prefix(source_dir).ok().map(Path::to_path_buf)
    }

    /// Sources of every group, generated sources included.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.source_groups.iter().flat_map(|g| g.all_sources().cloned()).collect()
    }

    /// Compile settings merged across all source groups.
    pub fn compile_settings(&self) -> CompileSettings {
        let mut merged = CompileSettings::default();
        for group in &self.source_groups {
            merged.merge(&group.settings);
        }
        merged
    }

    /// File name of the declared output, if any.
    pub fn output_file_name(&self) -> Option<&str> {
        self.output.as_ref().and_then(|p| p.file_name()).and_then(|n| n.to_str())
    }
}

/// A user-visible build option, carried through for the reconfigure step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOption {
    pub name: String,
    #[serde(default)]
    pub section: String,
    #[serde(rename = "type", default)]
    pub option_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<serde_json::Value>>,
}

/// Project-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub descriptive_name: String,
    #[serde(default)]
    pub version: String,
}
