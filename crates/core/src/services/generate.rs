use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::graph::{GraphAssembler, GraphError};
use crate::headers::{attribute_listing, AttributionStats, HeaderError, TargetMatcher};
use crate::identity::fresh_id;
use crate::introspect::{IntrospectError, Introspection};
use crate::layout::BuildContext;
use crate::services::emit::{EmitError, GraphEmitter, SolutionManifest};
use crate::services::engine::{BuildEngine, EngineError};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Introspect(#[from] IntrospectError),

    #[error("Dependency listing query to {engine} failed: {source}")]
    DependencyQuery {
        engine: String,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Headers(#[from] HeaderError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Summary of a completed generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub solution_name: String,
    pub output: PathBuf,
    pub projects: usize,
    pub folders: usize,
    pub attribution: AttributionStats,
}

/// One generation run: introspection + dependency query in, manifest out.
pub struct Generator<'a> {
    pub ctx: &'a BuildContext,
    pub engine: &'a dyn BuildEngine,
    pub matcher: &'a dyn TargetMatcher,
    /// Command the emitted steps use to call back into this tool.
    pub driver: Vec<String>,
}

impl<'a> Generator<'a> {
    /// Compute the full manifest without writing anything.
    ///
    /// Every fatal condition surfaces here, before an emitter is involved.
    pub fn plan(&self) -> Result<SolutionManifest, GenerateError> {
        let intro = Introspection::load(&self.ctx.layout.info_dir)?;

        let listing = self.engine.dependency_listing().map_err(|source| {
            GenerateError::DependencyQuery { engine: self.engine.name().to_string(), source }
        })?;
        let attribution = attribute_listing(
            &listing,
            &intro.targets,
            self.matcher,
            &intro.source_dir,
            &self.ctx.layout.root,
        )?;

        let graph = GraphAssembler::new(&intro.source_dir, &intro.build_dir)
            .with_run_folder(self.ctx.config.run_folder.clone())
            .assemble(&intro.targets, &attribution.headers, &intro.buildsystem_files)?;

        let solution_name = self
            .ctx
            .config
            .solution_name
            .clone()
            .unwrap_or_else(|| intro.project.descriptive_name.clone());

        Ok(SolutionManifest {
            solution_name,
            generation_id: fresh_id(),
            build_type: intro.build_type(),
            platform: self.ctx.config.platform.clone(),
            source_dir: intro.source_dir,
            build_dir: intro.build_dir,
            driver: self.driver.clone(),
            build_options: intro.build_options,
            attribution: attribution.stats,
            graph,
        })
    }

    /// Plan, then hand the result to `emitter`.
    pub fn generate(&self, emitter: &dyn GraphEmitter) -> Result<GenerationReport, GenerateError> {
        let manifest = self.plan()?;
        let output = emitter.emit(&manifest)?;
        info!(
            solution = %manifest.solution_name,
            output = %output.display(),
            "generation finished"
        );

        Ok(GenerationReport {
            solution_name: manifest.solution_name,
            output,
            projects: manifest.graph.projects.len(),
            folders: manifest.graph.folders.len(),
            attribution: manifest.attribution,
        })
    }
}
