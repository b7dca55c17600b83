use std::fs;
use std::path::Path;

use slngen::commands::{manifest_path, open_context, solution_name};
use slngen::{canonicalize_or_current, driver_command};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    assert_eq!(result, expected);

    std::env::set_current_dir(original).expect("restore cwd");
}

#[test]
fn canonicalize_or_current_keeps_absolute_missing_paths() {
    let tmp = tempdir().expect("tempdir");
    let missing = tmp.path().join("not-configured-yet");
    let result = canonicalize_or_current(missing.to_str().expect("utf8")).expect("resolve");
    assert_eq!(result, missing);
}

#[test]
fn driver_command_points_back_at_the_build_root() {
    let driver = driver_command(Path::new("/work/build"));
    assert_eq!(driver.len(), 3);
    assert_eq!(driver[1], "--build-root");
    assert_eq!(driver[2], "/work/build");
}

#[test]
fn solution_name_prefers_config_override() {
    let tmp = tempdir().expect("tempdir");
    fs::write(tmp.path().join("slngen.yaml"), "solution_name: Override\n").expect("config");
    let ctx = open_context(tmp.path().to_str().expect("utf8")).expect("ctx");
    assert_eq!(solution_name(&ctx).expect("name"), "Override");
    assert_eq!(manifest_path(&ctx).expect("path"), ctx.layout.root.join("Override.slngen.json"));
}

#[test]
fn solution_name_needs_introspection_without_override() {
    let tmp = tempdir().expect("tempdir");
    let ctx = open_context(tmp.path().to_str().expect("utf8")).expect("ctx");
    let err = solution_name(&ctx).expect_err("no meson-info");
    assert!(format!("{err:#}").contains("intro-benchmarks.json"));
}
