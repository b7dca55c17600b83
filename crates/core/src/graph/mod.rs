//! Solution graph assembly: project nodes, folder nodes and build-order edges.
//!
//! The graph is rebuilt from scratch on every generation run. Node ids come
//! from [`crate::identity::stable_id`], so an unchanged target set always
//! yields the same graph.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::headers::HeaderSet;
use crate::identity::{stable_id, NodeId};
use crate::model::{CompileSettings, Target};

/// Default name of the folder holding every synthetic run step.
pub const DEFAULT_RUN_FOLDER: &str = "Build to run";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Project {project} nests under folder {folder}, which is not in the graph")]
    DanglingFolder { project: String, folder: NodeId },

    #[error("Folder {folder} has parent {parent}, which is not in the graph")]
    DanglingParent { folder: String, parent: NodeId },

    #[error("Project {project} depends on {dependency}, which is not in the graph")]
    DanglingDependency { project: String, dependency: NodeId },

    #[error("Node id {id} is used by more than one node (second: {name})")]
    DuplicateId { id: NodeId, name: String },

    #[error("Graph has no prebuild step")]
    MissingPrebuild,
}

/// Synthetic run steps present in every graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Prebuild,
    BuildAll,
    Install,
    Test,
    Regenerate,
    Reconfigure,
}

impl StepKind {
    pub const ALL: [StepKind; 6] = [
        StepKind::Prebuild,
        StepKind::BuildAll,
        StepKind::Install,
        StepKind::Test,
        StepKind::Regenerate,
        StepKind::Reconfigure,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            StepKind::Prebuild => "Solution prebuild",
            StepKind::BuildAll => "Build all",
            StepKind::Install => "Run install",
            StepKind::Test => "Run tests",
            StepKind::Regenerate => "Regenerate solution",
            StepKind::Reconfigure => "Reconfigure project",
        }
    }

    /// Identity path (and project file stem) of the step.
    pub fn file_stem(self) -> &'static str {
        match self {
            StepKind::Prebuild => "Solution_prebuild",
            StepKind::BuildAll => "Build_all",
            StepKind::Install => "Run_install",
            StepKind::Test => "Run_tests",
            StepKind::Regenerate => "Regenerate_solution",
            StepKind::Reconfigure => "Reconfigure_project",
        }
    }

    /// Built when the IDE builds the solution with nothing selected.
    ///
    /// Compiled targets are never built by default: the engine schedules and
    /// parallelizes them itself through the build-all step.
    pub fn build_by_default(self) -> bool {
        matches!(self, StepKind::Prebuild | StepKind::BuildAll | StepKind::Regenerate)
    }

    fn action(self) -> StepAction {
        match self {
            StepKind::Prebuild => StepAction::ClearMarkers,
            StepKind::BuildAll => StepAction::CompileAll,
            StepKind::Install => StepAction::Install,
            StepKind::Test => StepAction::Test,
            StepKind::Regenerate => StepAction::Regenerate,
            StepKind::Reconfigure => StepAction::Reconfigure,
        }
    }
}

/// What a project node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "step")]
pub enum ProjectKind {
    Compiled,
    RunTarget,
    Step(StepKind),
}

/// Command the IDE runs for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum StepAction {
    /// Reset the coordination scratch directory.
    ClearMarkers,
    /// One engine invocation over the whole graph.
    CompileAll,
    /// Coordinated single-target build (skipped during a solution build).
    CompileTarget { target: String },
    /// Run target: always invokes the engine for that target.
    RunTarget { target: String },
    Clean,
    Install,
    Test,
    Regenerate,
    Reconfigure,
}

impl StepAction {
    /// Arguments for the `slngen` CLI that carry out this action.
    pub fn cli_args(&self) -> Vec<String> {
        let args: Vec<&str> = match self {
            StepAction::ClearMarkers => vec!["prebuild"],
            StepAction::CompileAll => vec!["build-all"],
            StepAction::CompileTarget { target } => {
                vec!["build-target", "--target", target.as_str()]
            }
            StepAction::RunTarget { target } => {
                vec!["build-target", "--target", target.as_str(), "--direct"]
            }
            StepAction::Clean => vec!["step", "clean"],
            StepAction::Install => vec!["step", "install"],
            StepAction::Test => vec!["step", "test"],
            StepAction::Regenerate => vec!["generate"],
            StepAction::Reconfigure => vec!["step", "reconfigure"],
        };
        args.into_iter().map(str::to_string).collect()
    }
}

/// Files and compiler settings of a compiled target's project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFiles {
    pub sources: Vec<PathBuf>,
    pub extra_files: Vec<PathBuf>,
    pub headers: Vec<PathBuf>,
    pub settings: CompileSettings,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub id: NodeId,
    /// Build-directory relative identity path; also the project file stem.
    pub identity: PathBuf,
    pub name: String,
    pub build_by_default: bool,
    pub kind: ProjectKind,
    pub folder: Option<NodeId>,
    pub depends_on: Vec<NodeId>,
    pub build: StepAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean: Option<StepAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<ProjectFiles>,
    /// Files whose change should re-trigger this step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PathBuf>,
}

impl ProjectNode {
    pub fn is_run_step(&self) -> bool {
        !matches!(self.kind, ProjectKind::Compiled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub id: NodeId,
    pub name: String,
    /// Source-root relative path; the folder name itself for the reserved folder.
    pub path: PathBuf,
    pub parent: Option<NodeId>,
    /// Holds the synthetic run steps rather than mirroring the source tree.
    pub reserved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionGraph {
    pub folders: Vec<FolderNode>,
    pub projects: Vec<ProjectNode>,
}

impl SolutionGraph {
    pub fn project(&self, id: NodeId) -> Option<&ProjectNode> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_by_name(&self, name: &str) -> Option<&ProjectNode> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn folder(&self, id: NodeId) -> Option<&FolderNode> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn folder_by_path(&self, path: &Path) -> Option<&FolderNode> {
        self.folders.iter().find(|f| !f.reserved && f.path == path)
    }

    pub fn step(&self, kind: StepKind) -> Option<&ProjectNode> {
        self.projects.iter().find(|p| p.kind == ProjectKind::Step(kind))
    }

    /// Check the internal consistency the emitter relies on.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen: HashSet<NodeId> = HashSet::new();
        for (id, name) in self
            .folders
            .iter()
            .map(|f| (f.id, &f.name))
            .chain(self.projects.iter().map(|p| (p.id, &p.name)))
        {
            if !seen.insert(id) {
                return Err(GraphError::DuplicateId { id, name: name.clone() });
            }
        }

        let folder_ids: HashSet<NodeId> = self.folders.iter().map(|f| f.id).collect();
        for folder in &self.folders {
            if let Some(parent) = folder.parent {
                if !folder_ids.contains(&parent) {
                    return Err(GraphError::DanglingParent { folder: folder.name.clone(), parent });
                }
            }
        }

        let project_ids: HashSet<NodeId> = self.projects.iter().map(|p| p.id).collect();
        for project in &self.projects {
            if let Some(folder) = project.folder {
                if !folder_ids.contains(&folder) {
                    return Err(GraphError::DanglingFolder {
                        project: project.name.clone(),
                        folder,
                    });
                }
            }
            for dependency in &project.depends_on {
                if !project_ids.contains(dependency) {
                    return Err(GraphError::DanglingDependency {
                        project: project.name.clone(),
                        dependency: *dependency,
                    });
                }
            }
        }

        if self.step(StepKind::Prebuild).is_none() {
            return Err(GraphError::MissingPrebuild);
        }
        Ok(())
    }
}

/// Builds a [`SolutionGraph`] from loaded targets.
#[derive(Debug, Clone)]
pub struct GraphAssembler {
    source_dir: PathBuf,
    build_dir: PathBuf,
    run_folder: String,
}

impl GraphAssembler {
    pub fn new(source_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            run_folder: DEFAULT_RUN_FOLDER.to_string(),
        }
    }

    pub fn with_run_folder(mut self, name: impl Into<String>) -> Self {
        self.run_folder = name.into();
        self
    }

    pub fn assemble(
        &self,
        targets: &[Target],
        headers: &HeaderSet,
        buildsystem_files: &[PathBuf],
    ) -> Result<SolutionGraph, GraphError> {
        let run_folder = FolderNode {
            id: stable_id(&self.build_dir.join(&self.run_folder)),
            name: self.run_folder.clone(),
            path: PathBuf::from(&self.run_folder),
            parent: None,
            reserved: true,
        };

        let prebuild_id = stable_id(&self.build_dir.join(StepKind::Prebuild.file_stem()));
        let regenerate_id = stable_id(&self.build_dir.join(StepKind::Regenerate.file_stem()));

        let mut projects = Vec::with_capacity(StepKind::ALL.len() + targets.len());
        for kind in StepKind::ALL {
            let identity = PathBuf::from(kind.file_stem());
            let mut depends_on = Vec::new();
            if kind != StepKind::Prebuild {
                depends_on.push(prebuild_id);
            }
            // A stale graph must never be built against.
            if kind == StepKind::BuildAll {
                depends_on.push(regenerate_id);
            }
            let inputs =
                if kind == StepKind::Regenerate { buildsystem_files.to_vec() } else { Vec::new() };
            projects.push(ProjectNode {
                id: stable_id(&self.build_dir.join(&identity)),
                identity,
                name: kind.display_name().to_string(),
                build_by_default: kind.build_by_default(),
                kind: ProjectKind::Step(kind),
                folder: Some(run_folder.id),
                depends_on,
                build: kind.action(),
                clean: None,
                files: None,
                inputs,
            });
        }

        let mut folders: BTreeMap<PathBuf, FolderNode> = BTreeMap::new();
        for target in targets {
            let folder = target
                .folder(&self.source_dir)
                .filter(|path| !path.as_os_str().is_empty())
                .map(|path| self.materialize_folders(&path, &mut folders));

            let (kind, build, clean, files) = if target.kind.is_run() {
                let build = StepAction::RunTarget { target: target.name.clone() };
                (ProjectKind::RunTarget, build, None, None)
            } else {
                let sources = target.sources();
                // The dependency listing also names the translation units themselves.
                let headers = headers
                    .headers_for(&target.identity)
                    .into_iter()
                    .filter(|h| !sources.contains(h))
                    .collect();
                let files = ProjectFiles {
                    sources,
                    extra_files: target.extra_files.clone(),
                    headers,
                    settings: target.compile_settings(),
                    output: target.output.clone(),
                };
                (
                    ProjectKind::Compiled,
                    StepAction::CompileTarget { target: target.name.clone() },
                    Some(StepAction::Clean),
                    Some(files),
                )
            };

            projects.push(ProjectNode {
                id: stable_id(&self.build_dir.join(&target.identity)),
                identity: target.identity.clone(),
                name: target.name.clone(),
                build_by_default: false,
                kind,
                folder,
                depends_on: vec![prebuild_id],
                build,
                clean,
                files,
                inputs: Vec::new(),
            });
        }

        let mut all_folders = vec![run_folder];
        all_folders.extend(folders.into_values());
        let graph = SolutionGraph { folders: all_folders, projects };
        graph.validate()?;

        info!(
            projects = graph.projects.len(),
            folders = graph.folders.len(),
            "assembled solution graph"
        );
        Ok(graph)
    }

    /// Insert `path` and every ancestor prefix; returns the id of `path` itself.
    fn materialize_folders(
        &self,
        path: &Path,
        folders: &mut BTreeMap<PathBuf, FolderNode>,
    ) -> NodeId {
        let mut prefix = PathBuf::new();
        let mut parent: Option<NodeId> = None;
        for component in path.components() {
            prefix.push(component);
            let node = folders.entry(prefix.clone()).or_insert_with(|| FolderNode {
                id: stable_id(&self.source_dir.join(&prefix)),
                name: component.as_os_str().to_string_lossy().to_string(),
                path: prefix.clone(),
                parent,
                reserved: false,
            });
            parent = Some(node.id);
        }
        // Callers never pass an empty path.
        parent.unwrap_or_else(|| stable_id(&self.source_dir.join(path)))
    }
}
