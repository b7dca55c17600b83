#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{json, Value};
use slngen_core::introspect::INTROSPECTION_DOCUMENTS;
use slngen_core::services::{BuildEngine, EngineError};
use tempfile::TempDir;

/// A source tree at `<tmp>` with a build directory at `<tmp>/build`.
pub struct MesonFixture {
    _tmp: TempDir,
    pub source: PathBuf,
    pub build: PathBuf,
}

impl MesonFixture {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        // Canonical so header paths compare equal on platforms with symlinked temp dirs.
        let source = tmp.path().canonicalize().expect("canonical tempdir");
        let build = source.join("build");
        fs::create_dir_all(build.join("meson-info")).expect("create meson-info");
        Self { _tmp: tmp, source, build }
    }

    pub fn info_dir(&self) -> PathBuf {
        self.build.join("meson-info")
    }

    /// Write a file under the source tree, creating parents.
    pub fn write_source(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.source.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("create parents");
        fs::write(&path, contents).expect("write source file");
        path
    }

    /// Intro target entry declared by `<dir>/meson.build`.
    pub fn target(&self, name: &str, kind: &str, dir: &str, sources: &[&str]) -> Value {
        let defined_in = self.source.join(dir).join("meson.build");
        let sources: Vec<String> =
            sources.iter().map(|s| self.source.join(s).display().to_string()).collect();
        json!({
            "name": name,
            "id": format!("{name}@sha"),
            "type": kind,
            "defined_in": defined_in,
            "filename": [self.build.join(dir).join(name)],
            "build_by_default": true,
            "target_sources": [{
                "language": "c",
                "compiler": ["cc"],
                "parameters": ["-I../src/include", "-DFOO=1", "-Wall"],
                "sources": sources,
                "generated_sources": []
            }],
            "extra_files": []
        })
    }

    /// Write every introspection document, with `targets` as the target list.
    pub fn write_introspection(&self, targets: Vec<Value>) {
        let docs = [
            ("intro-benchmarks.json", json!([])),
            (
                "intro-buildoptions.json",
                json!([
                    {"name": "buildtype", "section": "core", "type": "combo", "value": "release",
                     "description": "Build type", "choices": ["plain", "debug", "release"]},
                    {"name": "warning_level", "section": "core", "type": "combo", "value": "1",
                     "description": "Warning level"}
                ]),
            ),
            ("intro-buildsystem_files.json", json!([self.source.join("meson.build")])),
            ("intro-dependencies.json", json!([])),
            ("intro-installed.json", json!({})),
            ("intro-projectinfo.json", json!({"descriptive_name": "demo", "version": "1.0"})),
            ("intro-targets.json", Value::Array(targets)),
            ("intro-tests.json", json!([{"name": "t1"}])),
            (
                "meson-info.json",
                json!({"directories": {"source": self.source, "build": self.build}}),
            ),
        ];
        for (name, body) in docs {
            fs::write(self.info_dir().join(name), body.to_string()).expect("write document");
        }
        assert_eq!(INTROSPECTION_DOCUMENTS.len(), 9);
    }

    /// Two libraries at `src/lib/a` and `src/lib/sub/b` with their headers on disk.
    pub fn two_library_project(&self) {
        self.write_source("src/lib/a/a.c", "int a;\n");
        self.write_source("src/lib/a/a.h", "");
        self.write_source("src/lib/sub/b.c", "int b;\n");
        self.write_source("src/lib/sub/b.h", "");
        self.write_introspection(vec![
            self.target("a", "static library", "src/lib/a", &["src/lib/a/a.c"]),
            self.target("b", "static library", "src/lib/sub", &["src/lib/sub/b.c"]),
        ]);
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.source.join(rel)
    }
}

/// Engine double that records calls and returns a canned dependency listing.
///
/// `Sync`, so concurrent steps can share one instance.
#[derive(Default)]
pub struct FakeEngine {
    pub listing: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn with_listing(listing: &str) -> Self {
        Self { listing: Some(listing.to_string()), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) -> Result<(), EngineError> {
        self.calls.lock().expect("calls lock").push(call);
        Ok(())
    }
}

impl BuildEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn dependency_listing(&self) -> Result<String, EngineError> {
        self.calls.lock().expect("calls lock").push("deps".to_string());
        self.listing.clone().ok_or_else(|| EngineError::Failed {
            command: "fake deps".to_string(),
            status: "exit status: 1".to_string(),
        })
    }

    fn compile(&self, target: Option<&str>) -> Result<(), EngineError> {
        self.record(format!("compile {}", target.unwrap_or("<all>")))
    }

    fn clean(&self) -> Result<(), EngineError> {
        self.record("clean".to_string())
    }

    fn install(&self) -> Result<(), EngineError> {
        self.record("install".to_string())
    }

    fn test(&self) -> Result<(), EngineError> {
        self.record("test".to_string())
    }

    fn reconfigure(&self) -> Result<(), EngineError> {
        self.record("reconfigure".to_string())
    }
}

/// `a.h` to target `a`, `b.h` to target `b`, plus a system header.
pub fn two_library_listing() -> String {
    concat!(
        "src/lib/a/a.p/a.c.o: #deps 2, deps mtime 1 (VALID)\n",
        "    ../src/lib/a/a.c\n",
        "    ../src/lib/a/a.h\n",
        "\n",
        "build/lib/sub/b.o: /usr/include/stdio.h ../src/lib/sub/b.h\n",
    )
    .to_string()
}
