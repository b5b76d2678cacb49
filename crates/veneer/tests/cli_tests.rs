/*
 * cli_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end tests for the veneer binary.
 */

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn veneer(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_veneer"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run veneer")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A skin directory with a layout, a page extending it and a partial.
fn skin_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let root = temp.path();
    fs::create_dir_all(root.join("partials")).unwrap();
    fs::write(
        root.join("layout.html"),
        "<title><% render title %></title><% render body %><% subskin title %>Untitled<% subskin body %>empty",
    )
    .unwrap();
    fs::write(
        root.join("page.html"),
        "<% extends layout %>\n<% subskin title %><% site.name | uppercase %><% subskin body %><% for item in <% items %> render partials/item %>",
    )
    .unwrap();
    fs::write(root.join("partials/item.html"), "[<% item %>]").unwrap();
    temp
}

#[test]
fn test_render_with_json_data() {
    let temp = skin_dir();
    fs::write(
        temp.path().join("data.json"),
        r#"{"site": {"name": "docs"}, "items": ["a", "b"]}"#,
    )
    .unwrap();

    let output = veneer(&["render", "page.html", "--data", "data.json"], temp.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "<title>DOCS</title>[a][b]");
}

#[test]
fn test_render_with_yaml_data() {
    let temp = skin_dir();
    fs::write(
        temp.path().join("data.yaml"),
        "site:\n  name: yaml\nitems: [x]",
    )
    .unwrap();

    let output = veneer(&["render", "page.html", "-d", "data.yaml"], temp.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "<title>YAML</title>[x]");
}

#[test]
fn test_render_without_data_uses_defaults() {
    let temp = skin_dir();
    let output = veneer(&["render", "layout.html"], temp.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "<title>Untitled</title>empty");
}

#[test]
fn test_render_single_fragment() {
    let temp = skin_dir();
    fs::write(temp.path().join("data.json"), r#"{"site": {"name": "frag"}}"#).unwrap();

    let output = veneer(
        &["render", "page.html", "--data", "data.json", "--fragment", "title"],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "FRAG");
}

#[test]
fn test_render_to_output_file() {
    let temp = skin_dir();
    let out = temp.path().join("out.html");

    let output = veneer(
        &["render", "layout.html", "-o", out.to_str().unwrap()],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "");
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "<title>Untitled</title>empty"
    );
}

#[test]
fn test_skin_dir_option() {
    let temp = skin_dir();
    let elsewhere = TempDir::new().unwrap();
    fs::write(
        elsewhere.path().join("standalone.html"),
        "<% extends layout %><% subskin title %>Elsewhere",
    )
    .unwrap();

    let output = veneer(
        &[
            "render",
            "standalone.html",
            "--skin-dir",
            temp.path().to_str().unwrap(),
        ],
        elsewhere.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "<title>Elsewhere</title>empty");
}

#[test]
fn test_config_file_search_paths() {
    let temp = skin_dir();
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join("veneer.toml"),
        format!("search-paths = [{:?}]\n", temp.path().display().to_string()),
    )
    .unwrap();
    fs::write(
        project.path().join("note.html"),
        "<% extends layout %><% subskin body %>configured",
    )
    .unwrap();

    let output = veneer(
        &["render", "note.html", "--config", "veneer.toml", "--no-cache"],
        project.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "<title>Untitled</title>configured");
}

#[test]
fn test_malformed_builtin_warns_but_succeeds() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("broken.html"), "a<% if %>b").unwrap();

    let output = veneer(&["render", "broken.html"], temp.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "a[Error in if macro: not enough parameters]b"
    );
    assert!(stderr(&output).contains("if macro: not enough parameters"));
}

#[test]
fn test_missing_skin_fails() {
    let temp = TempDir::new().unwrap();
    let output = veneer(&["render", "nope.html"], temp.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load skin nope.html"));
}

#[test]
fn test_missing_parent_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("orphan.html"), "<% extends ghost %>").unwrap();

    let output = veneer(&["render", "orphan.html"], temp.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("ghost"));
}

#[test]
fn test_unsupported_data_format() {
    let temp = skin_dir();
    fs::write(temp.path().join("data.txt"), "site=x").unwrap();

    let output = veneer(&["render", "page.html", "--data", "data.txt"], temp.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unsupported data file"));
}

#[test]
fn test_inspect_lists_chain_and_fragments() {
    let temp = skin_dir();
    let output = veneer(&["inspect", "page.html"], temp.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "origin: page.html");
    assert!(lines[1].starts_with("parent: "));
    assert!(lines[1].ends_with("layout.html"));
    assert_eq!(&lines[2..], &["fragment: title", "fragment: body"]);
}

#[test]
fn test_inspect_json() {
    let temp = skin_dir();
    let output = veneer(&["inspect", "layout.html", "--json"], temp.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["origin"], "layout.html");
    assert_eq!(report["parents"], serde_json::json!([]));
    assert_eq!(report["fragments"], serde_json::json!(["title", "body"]));
}
