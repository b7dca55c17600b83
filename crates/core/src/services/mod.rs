//! Orchestration on top of the pure modules: driving the build engine,
//! running a generation pass, emitting the manifest and executing steps.

pub mod emit;
pub mod engine;
pub mod generate;
pub mod steps;

pub use emit::{
    manifest_file_name, read_manifest, EmitError, GraphEmitter, JsonManifestEmitter,
    SolutionManifest,
};
pub use engine::{resolve_meson_command, BuildEngine, EngineError, MesonEngine};
pub use generate::{GenerateError, GenerationReport, Generator};
pub use steps::{Housekeeping, StepError, StepOutcome};
