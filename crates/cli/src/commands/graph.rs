use anyhow::{Context, Result};
use serde::Serialize;
use slngen_core::graph::{ProjectKind, ProjectNode, SolutionGraph};
use slngen_core::services::read_manifest;

use crate::commands::{manifest_path, open_context};

/// Flattened view of one project for `show-graph --json`.
#[derive(Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub id: String,
    pub kind: String,
    pub folder: Option<String>,
    pub build_by_default: bool,
    pub depends_on: Vec<String>,
    pub command: Vec<String>,
    pub headers: usize,
}

#[derive(Serialize)]
pub struct GraphSummary {
    pub solution_name: String,
    pub manifest: String,
    pub build_type: String,
    pub platform: String,
    pub folders: Vec<String>,
    pub projects: Vec<ProjectSummary>,
}

/// Print the graph recorded in the last generated manifest.
pub fn show_graph_command(build_root: &str, json: bool) -> Result<()> {
    let ctx = open_context(build_root)?;
    let path = manifest_path(&ctx)?;
    let manifest = read_manifest(&path).with_context(|| {
        format!("Failed to read solution manifest at {} (run `generate` first)", path.display())
    })?;

    let graph = &manifest.graph;
    let summary = GraphSummary {
        solution_name: manifest.solution_name.clone(),
        manifest: path.display().to_string(),
        build_type: manifest.build_type.clone(),
        platform: manifest.platform.clone(),
        folders: graph.folders.iter().map(|f| f.path.display().to_string()).collect(),
        projects: graph.projects.iter().map(|p| summarize(graph, &manifest.driver, p)).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Solution: {} ({}|{})", summary.solution_name, summary.build_type, summary.platform);
    println!("Manifest: {}", summary.manifest);
    println!("Folders:");
    for folder in &summary.folders {
        println!("  - {folder}");
    }
    println!("Projects:");
    for project in &summary.projects {
        let folder = project.folder.as_deref().unwrap_or("<root>");
        let default = if project.build_by_default { ", default" } else { "" };
        println!("  - {} [{}{}] in {}", project.name, project.kind, default, folder);
        if !project.depends_on.is_empty() {
            println!("      depends on: {}", project.depends_on.join(", "));
        }
        if project.headers > 0 {
            println!("      headers: {}", project.headers);
        }
    }

    Ok(())
}

fn summarize(graph: &SolutionGraph, driver: &[String], project: &ProjectNode) -> ProjectSummary {
    let kind = match project.kind {
        ProjectKind::Compiled => "compiled".to_string(),
        ProjectKind::RunTarget => "run".to_string(),
        ProjectKind::Step(_) => "step".to_string(),
    };
    let folder = project
        .folder
        .and_then(|id| graph.folder(id))
        .map(|f| f.path.display().to_string());
    let depends_on = project
        .depends_on
        .iter()
        .map(|id| graph.project(*id).map_or_else(|| id.to_string(), |p| p.name.clone()))
        .collect();
    let mut command = driver.to_vec();
    command.extend(project.build.cli_args());

    ProjectSummary {
        name: project.name.clone(),
        id: project.id.to_string(),
        kind,
        folder,
        build_by_default: project.build_by_default,
        depends_on,
        command,
        headers: project.files.as_ref().map_or(0, |f| f.headers.len()),
    }
}
