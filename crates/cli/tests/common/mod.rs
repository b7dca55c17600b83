#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

/// Source tree with one library at `src/lib` and a configured build dir at `build/`.
pub struct Project {
    _tmp: TempDir,
    pub source: PathBuf,
    pub build: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().canonicalize().expect("canonical tempdir");
        let build = source.join("build");
        fs::create_dir_all(build.join("meson-info")).expect("meson-info");
        fs::create_dir_all(source.join("src/lib")).expect("src/lib");
        fs::write(source.join("src/lib/a.c"), "int a;\n").expect("a.c");
        fs::write(source.join("src/lib/a.h"), "").expect("a.h");
        fs::write(source.join("meson.build"), "project('demo', 'c')\n").expect("meson.build");
        Self { _tmp: tmp, source, build }
    }

    /// Write the introspection documents, optionally leaving one out.
    pub fn configure(&self, skip: Option<&str>) {
        let target = |name: &str, kind: &str, dir: &str| {
            json!({
                "name": name,
                "id": format!("{name}@sha"),
                "type": kind,
                "defined_in": self.source.join(dir).join("meson.build"),
                "filename": [self.build.join(dir).join(name)],
                "build_by_default": true,
                "target_sources": [{
                    "language": "c",
                    "compiler": ["cc"],
                    "parameters": ["-DA=1"],
                    "sources": [self.source.join("src/lib/a.c")],
                    "generated_sources": []
                }],
                "extra_files": []
            })
        };
        let docs = [
            ("intro-benchmarks.json", json!([])),
            ("intro-buildoptions.json", json!([{"name": "buildtype", "value": "debug"}])),
            ("intro-buildsystem_files.json", json!([self.source.join("meson.build")])),
            ("intro-dependencies.json", json!([])),
            ("intro-installed.json", json!({})),
            ("intro-projectinfo.json", json!({"descriptive_name": "demo", "version": "0.1"})),
            (
                "intro-targets.json",
                json!([target("a", "static library", "src/lib"), target("docs", "run", "")]),
            ),
            ("intro-tests.json", json!([])),
            (
                "meson-info.json",
                json!({"directories": {"source": self.source, "build": self.build}}),
            ),
        ];
        for (name, body) in docs {
            if Some(name) == skip {
                continue;
            }
            fs::write(self.build.join("meson-info").join(name), body.to_string())
                .expect("write document");
        }
    }

    /// Short coordination window so CLI tests stay fast.
    pub fn fast_coordination(&self) {
        fs::write(self.build.join("slngen.yaml"), "coordination_window_ms: 10\n").expect("config");
    }

    pub fn manifest(&self) -> PathBuf {
        self.build.join("demo.slngen.json")
    }

    pub fn scratch(&self) -> PathBuf {
        self.build.join(".slngen").join("markers")
    }
}

/// Shell script standing in for `meson`: logs its arguments, prints a deps listing.
#[cfg(unix)]
pub fn fake_meson(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-meson.sh");
    let body = format!(
        "#!/bin/sh\necho \"$@\" >> '{log}'\n\
         echo 'src/lib/a.p/a.c.o: #deps 2, deps mtime 1 (VALID)'\n\
         echo '    ../src/lib/a.c'\necho '    ../src/lib/a.h'\n",
        log = dir.join("meson-calls.log").display()
    );
    fs::write(&script, body).expect("write fake meson");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
    script
}

pub fn meson_calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("meson-calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
