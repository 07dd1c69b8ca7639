mod common;

use std::process::{Command, Output};

use atlas_extract::container::Container;

fn atlas_extract(args: &[&str]) -> Output {
    atlas_extract_logging(args, "warn")
}

fn atlas_extract_logging(args: &[&str], rust_log: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_atlas-extract"))
        .args(args)
        .env("RUST_LOG", rust_log)
        .env_remove("ATLAS_EXTRACT_PAGE_SIZE")
        .output()
        .unwrap()
}

fn path(p: &std::path::Path) -> &str {
    p.to_str().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_prints_usage_and_fails() {
    let out = atlas_extract(&["-h"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Usage"));
}

#[test]
fn version_succeeds() {
    let out = atlas_extract(&["--version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_output_path_fails() {
    let ws = common::workspace();
    let out = atlas_extract(&[path(&ws.input)]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("missing output file"));
    assert!(!ws.output.exists());
}

#[test]
fn extracts_requested_variable() {
    let ws = common::workspace();
    let out = atlas_extract(&[
        "-v",
        "temp,mask",
        "--no-memory-check",
        path(&ws.input),
        path(&ws.output),
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let c = Container::open(&ws.output).unwrap();
    assert!(c.find_variable("temp").is_some());
    assert!(c.find_variable("mask").is_some());
    assert!(c.find_variable("grid").is_none());
}

#[test]
fn unknown_variable_is_named_in_diagnostics() {
    let ws = common::workspace();
    let out = atlas_extract(&[
        "-v",
        "nosuch",
        path(&ws.input),
        path(&ws.output),
    ]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("nosuch"));
    assert!(!ws.output.exists());
}

#[test]
fn no_variables_warns_and_succeeds() {
    let ws = common::workspace();
    let out = atlas_extract(&[path(&ws.input), path(&ws.output)]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("no variables requested"));

    let c = Container::open(&ws.output).unwrap();
    assert_eq!(c.variables().count(), 0);
}

#[test]
fn diagnostics_do_not_depend_on_log_filter() {
    let ws = common::workspace();
    let out = atlas_extract_logging(
        &["-v", "nosuch", path(&ws.input), path(&ws.output)],
        "off",
    );
    assert!(!out.status.success());
    assert!(stderr(&out).contains("nosuch"));

    let out = atlas_extract_logging(&[path(&ws.input), path(&ws.output)], "error");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("no variables requested"));
}

#[test]
fn page_size_from_environment() {
    let ws = common::workspace();
    let out = Command::new(env!("CARGO_BIN_EXE_atlas-extract"))
        .args(["-v", "grid"])
        .arg(&ws.input)
        .arg(&ws.output)
        .env("RUST_LOG", "info")
        .env("ATLAS_EXTRACT_PAGE_SIZE", "96")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("pages=10"));
}

#[test]
fn zero_page_size_is_a_usage_error() {
    let ws = common::workspace();
    let out = atlas_extract(&[
        "--page-size",
        "0",
        path(&ws.input),
        path(&ws.output),
    ]);
    assert!(!out.status.success());
    assert!(!ws.output.exists());
}
