mod common;

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use common::{two_library_listing, FakeEngine, MesonFixture};
use slngen_core::headers::SegmentMatcher;
use slngen_core::introspect::IntrospectError;
use slngen_core::layout::BuildContext;
use slngen_core::services::{
    read_manifest, EmitError, GenerateError, Generator, GraphEmitter, JsonManifestEmitter,
    SolutionManifest,
};

#[derive(Default)]
struct CapturingEmitter {
    emitted: RefCell<Vec<SolutionManifest>>,
}

impl GraphEmitter for CapturingEmitter {
    fn emit(&self, manifest: &SolutionManifest) -> Result<PathBuf, EmitError> {
        self.emitted.borrow_mut().push(manifest.clone());
        Ok(PathBuf::from("captured"))
    }
}

fn generator<'a>(ctx: &'a BuildContext, engine: &'a FakeEngine) -> Generator<'a> {
    Generator {
        ctx,
        engine,
        matcher: &SegmentMatcher,
        driver: vec!["slngen".to_string(), "--build-root".to_string()],
    }
}

fn manifests_in(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read build dir")
        .map(|e| e.expect("entry").path())
        .filter(|p| p.to_string_lossy().contains(".slngen.json"))
        .collect();
    found.sort();
    found
}

#[test]
fn generation_writes_the_manifest_atomically() {
    let fx = MesonFixture::new();
    fx.two_library_project();
    let ctx = BuildContext::from_root(&fx.build).expect("ctx");
    let engine = FakeEngine::with_listing(&two_library_listing());

    let emitter = JsonManifestEmitter::in_dir(&fx.build);
    let report = generator(&ctx, &engine).generate(&emitter).expect("generate");

    assert_eq!(report.solution_name, "demo");
    assert_eq!(report.output, fx.build.join("demo.slngen.json"));
    assert_eq!(report.projects, 8);
    assert_eq!(report.folders, 5);
    assert_eq!(report.attribution.attributed, 2);
    assert_eq!(manifests_in(&fx.build), vec![fx.build.join("demo.slngen.json")]);
    assert_eq!(engine.calls(), vec!["deps"]);

    let manifest = read_manifest(&report.output).expect("read back");
    assert_eq!(manifest.build_type, "release");
    assert_eq!(manifest.platform, "x64");
    assert_eq!(manifest.source_dir, fx.source);
    assert_eq!(manifest.build_options.len(), 2);
    assert_eq!(manifest.graph.projects.len(), 8);
}

#[test]
fn failed_dependency_query_aborts_before_writing() {
    let fx = MesonFixture::new();
    fx.two_library_project();
    let ctx = BuildContext::from_root(&fx.build).expect("ctx");
    let engine = FakeEngine::default();
    let emitter = CapturingEmitter::default();

    let err = generator(&ctx, &engine).generate(&emitter).expect_err("must fail");
    assert!(matches!(err, GenerateError::DependencyQuery { .. }));
    assert!(err.to_string().contains("Dependency listing query"));
    assert!(emitter.emitted.borrow().is_empty());
    assert!(manifests_in(&fx.build).is_empty());
}

#[test]
fn missing_introspection_aborts_before_querying_the_engine() {
    let fx = MesonFixture::new();
    fx.two_library_project();
    fs::remove_file(fx.info_dir().join("intro-tests.json")).expect("remove");
    let ctx = BuildContext::from_root(&fx.build).expect("ctx");
    let engine = FakeEngine::with_listing("");
    let emitter = CapturingEmitter::default();

    let err = generator(&ctx, &engine).generate(&emitter).expect_err("must fail");
    match &err {
        GenerateError::Introspect(IntrospectError::Missing { document, .. }) => {
            assert_eq!(document, "intro-tests.json")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("intro-tests.json"));
    assert!(engine.calls().is_empty());
    assert!(emitter.emitted.borrow().is_empty());
}

#[test]
fn config_overrides_solution_name_platform_and_run_folder() {
    let fx = MesonFixture::new();
    fx.two_library_project();
    fs::write(
        fx.build.join("slngen.yaml"),
        "solution_name: Workspace\nplatform: Win32\nrun_folder: Steps\n",
    )
    .expect("write config");
    let ctx = BuildContext::from_root(&fx.build).expect("ctx");
    let engine = FakeEngine::with_listing(&two_library_listing());

    let manifest = generator(&ctx, &engine).plan().expect("plan");
    assert_eq!(manifest.solution_name, "Workspace");
    assert_eq!(manifest.platform, "Win32");
    assert!(manifest.graph.folders.iter().any(|f| f.reserved && f.name == "Steps"));
    assert_eq!(manifest.driver, vec!["slngen", "--build-root"]);
}

#[test]
fn regeneration_keeps_node_ids_but_not_the_generation_id() {
    let fx = MesonFixture::new();
    fx.two_library_project();
    let ctx = BuildContext::from_root(&fx.build).expect("ctx");
    let engine = FakeEngine::with_listing(&two_library_listing());
    let emitter = CapturingEmitter::default();

    let generator = generator(&ctx, &engine);
    generator.generate(&emitter).expect("first");
    generator.generate(&emitter).expect("second");

    let emitted = emitter.emitted.borrow();
    assert_eq!(emitted.len(), 2);
    assert_eq!(emitted[0].graph, emitted[1].graph);
    assert_ne!(emitted[0].generation_id, emitted[1].generation_id);
}
