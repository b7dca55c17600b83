use std::env;
use std::fs;
use std::path::Path;

use slngen_core::services::engine::{
    discover_meson_command, resolve_meson_command, split_command, MESON_ENV_VAR,
};
use slngen_core::services::{BuildEngine, EngineError, MesonEngine};

fn write_ninja(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("build.ninja");
    fs::write(&path, body).expect("write build.ninja");
    path
}

#[test]
fn configure_command_is_recovered_from_regenerate_rule() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ninja = write_ninja(
        tmp.path(),
        "ninja_required_version = 1.8.2\n\nrule REGENERATE_BUILD\n command = /usr/bin/python3 \
         /opt/meson/meson.py --internal regenerate /src /build\n description = Regenerating\n",
    );
    assert_eq!(
        discover_meson_command(&ninja),
        Some(vec!["/usr/bin/python3".to_string(), "/opt/meson/meson.py".to_string()])
    );

    let quoted = write_ninja(
        tmp.path(),
        "rule REGENERATE_BUILD\n command = \"/usr/local/bin/meson\" \"--internal\" regenerate\n",
    );
    assert_eq!(discover_meson_command(&quoted), Some(vec!["/usr/local/bin/meson".to_string()]));

    let without_rule = write_ninja(tmp.path(), "rule c_COMPILER\n command = cc $in\n");
    assert_eq!(discover_meson_command(&without_rule), None);
    assert_eq!(discover_meson_command(&tmp.path().join("absent.ninja")), None);
}

#[test]
fn command_resolution_prefers_env_then_config_then_build_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ninja = write_ninja(
        tmp.path(),
        "rule REGENERATE_BUILD\n command = /opt/meson --internal regenerate\n",
    );

    env::remove_var(MESON_ENV_VAR);
    assert_eq!(resolve_meson_command(None, &ninja), vec!["/opt/meson"]);
    let configured = resolve_meson_command(Some("python3 meson.py"), &ninja);
    assert_eq!(configured, vec!["python3", "meson.py"]);
    assert_eq!(resolve_meson_command(None, &tmp.path().join("missing")), vec!["meson"]);

    env::set_var(MESON_ENV_VAR, "/env/meson");
    assert_eq!(resolve_meson_command(Some("configured"), &ninja), vec!["/env/meson"]);
    env::remove_var(MESON_ENV_VAR);

    assert_eq!(split_command("  \"meson\"   --verbose "), vec!["meson", "--verbose"]);
}

#[test]
fn missing_program_is_a_spawn_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let engine =
        MesonEngine::new(vec!["/definitely/not/a/meson-binary".to_string()], tmp.path());
    match engine.dependency_listing() {
        Err(EngineError::Spawn { command, .. }) => {
            assert!(command.contains("--ninja-args=-t,deps"))
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(MesonEngine::new(Vec::new(), tmp.path()).command_line().to_vec(), vec!["meson"]);
}

#[cfg(unix)]
mod with_fake_meson {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use slngen_core::services::{BuildEngine, EngineError, MesonEngine};

    fn fake_meson(dir: &Path, exit_code: i32) -> PathBuf {
        let script = dir.join("fake-meson.sh");
        let log = dir.join("calls.log");
        let body = format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\n\
             echo 'obj.o: #deps 0, deps mtime 0 (VALID)'\nexit {}\n",
            log.display(),
            exit_code
        );
        fs::write(&script, body).expect("write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
        script
    }

    fn calls(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn engine_commands_run_in_the_build_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let script = fake_meson(tmp.path(), 0);
        let engine = MesonEngine::new(vec![script.display().to_string()], tmp.path());
        let dir = tmp.path().display().to_string();

        let listing = engine.dependency_listing().expect("listing");
        assert!(listing.starts_with("obj.o:"));
        engine.compile(Some("a")).expect("compile a");
        engine.compile(None).expect("compile all");
        engine.clean().expect("clean");
        engine.install().expect("install");
        engine.test().expect("test");
        engine.reconfigure().expect("reconfigure");

        assert_eq!(
            calls(tmp.path()),
            vec![
                format!("compile -C {dir} --ninja-args=-t,deps"),
                format!("compile -C {dir} a"),
                format!("compile -C {dir}"),
                format!("compile -C {dir} --clean"),
                format!("install -C {dir}"),
                format!("test -C {dir}"),
                format!("setup --reconfigure {dir}"),
            ]
        );
    }

    #[test]
    fn non_zero_exit_is_reported_with_the_command() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let script = fake_meson(tmp.path(), 3);
        let engine = MesonEngine::new(vec![script.display().to_string()], tmp.path());

        let err = engine.compile(Some("a")).expect_err("must fail");
        assert!(matches!(err, EngineError::Failed { .. }));
        assert!(err.to_string().contains("compile -C"));
        assert!(engine.dependency_listing().is_err());
    }
}
