//! Integration tests for `remapres resolve` and `remapres remaps`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn remapres() -> Command {
    Command::new(env!("CARGO_BIN_EXE_remapres"))
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Project with a browser map and one installed dependency.
fn create_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();

    write(
        &root,
        "package.json",
        r#"{
            "name": "app",
            "main": "./main.js",
            "browser": {
                "./server.js": "./client.js",
                "./native.js": false,
                "dep": "./shim.js"
            }
        }"#,
    );
    write(&root, "main.js", "");
    write(&root, "server.js", "");
    write(&root, "client.js", "");
    write(&root, "native.js", "");
    write(&root, "shim.js", "");
    write(&root, "other.js", "");
    write(&root, "node_modules/dep/package.json", r#"{"main": "lib/dep.js"}"#);
    write(&root, "node_modules/dep/lib/dep.js", "");
    write(&root, "node_modules/plain/index.js", "");

    (dir, root)
}

fn run(root: &Path, args: &[&str]) -> Output {
    remapres()
        .arg("--cwd")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("REMAPRES_CONFIG")
        .output()
        .expect("Failed to run remapres")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

#[test]
fn test_resolve_human_output() {
    let (_dir, root) = create_project();

    let output = run(&root, &["resolve", "./server", "./native", "plain"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("./server -> {}", root.join("client.js").display()));
    assert_eq!(lines[1], "./native -> (empty)");
    assert_eq!(
        lines[2],
        format!("plain -> {}", root.join("node_modules/plain/index.js").display())
    );
}

#[test]
fn test_resolve_json_output() {
    let (_dir, root) = create_project();

    let output = run(&root, &["--json", "resolve", "dep", "./other", "--provenance"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["schema_version"].as_u64(), Some(1));
    assert_eq!(json["from"].as_str(), root.to_str());

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0]["specifier"], "dep");
    assert_eq!(results[0]["status"], "resolved");
    assert_eq!(results[0]["path"].as_str(), root.join("shim.js").to_str());
    let steps = results[0]["provenance"].as_array().unwrap();
    assert!(steps.iter().any(|s| s["type"] == "remap"));

    assert_eq!(results[1]["status"], "resolved");
    assert_eq!(results[1]["path"].as_str(), root.join("other.js").to_str());
}

#[test]
fn test_resolve_not_found_exit_code() {
    let (_dir, root) = create_project();

    let output = run(&root, &["--json", "resolve", "./main", "./missing"]);
    assert_eq!(output.status.code(), Some(1));

    let json = stdout_json(&output);
    assert_eq!(json["results"][0]["status"], "resolved");
    assert_eq!(json["results"][1]["status"], "not_found");
    assert!(json["results"][1].get("path").is_none());
}

#[test]
fn test_resolve_error_exit_code() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    write(&root, "package.json", r#"{"browser": {"./a.js": "./nowhere.js"}}"#);
    write(&root, "a.js", "");

    let output = run(&root, &["--json", "resolve", "./a"]);
    assert_eq!(output.status.code(), Some(2));

    let json = stdout_json(&output);
    let result = &json["results"][0];
    assert_eq!(result["status"], "error");
    assert_eq!(result["error"]["code"], "REMAP_NOT_FOUND");
}

#[test]
fn test_resolve_caller_remap() {
    let (_dir, root) = create_project();

    let output = run(
        &root,
        &["resolve", "./other", "--remap", "other.js=false"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "./other -> (empty)");
}

#[test]
fn test_resolve_from_subdirectory() {
    let (_dir, root) = create_project();
    write(&root, "src/util.js", "");

    let output = run(&root, &["--json", "resolve", "--from", "src", "../server", "./util"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["from"].as_str(), root.join("src").to_str());
    assert_eq!(json["results"][0]["path"].as_str(), root.join("client.js").to_str());
    assert_eq!(json["results"][1]["path"].as_str(), root.join("src/util.js").to_str());
}

#[test]
fn test_resolve_stats_in_json() {
    let (_dir, root) = create_project();

    let output = run(&root, &["--json", "resolve", "./server", "--stats"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["stats"]["resolved"]["misses"].as_u64(), Some(1));
}

#[test]
fn test_remaps_json() {
    let (_dir, root) = create_project();

    let output = run(&root, &["--json", "remaps"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let remaps = json["remaps"].as_array().unwrap();

    let target_of = |source: &Path| {
        remaps
            .iter()
            .find(|e| e["source"].as_str() == source.to_str())
            .map(|e| e["target"].clone())
    };

    assert_eq!(
        target_of(&root.join("server.js")),
        Some(serde_json::json!(root.join("client.js")))
    );
    assert_eq!(target_of(&root.join("native.js")), Some(serde_json::json!(false)));
    assert_eq!(
        target_of(&root.join("node_modules/dep/lib/dep.js")),
        Some(serde_json::json!(root.join("shim.js")))
    );
}

#[test]
fn test_remaps_human_empty() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();

    let output = run(&root, &["remaps"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("No remaps declared"));
}

#[test]
fn test_config_file_changes_remap_field() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    write(
        &root,
        "package.json",
        r#"{"worker": {"./a.js": "./b.js"}, "browser": {"./a.js": false}}"#,
    );
    write(&root, "a.js", "");
    write(&root, "b.js", "");
    write(&root, "remapres.json", r#"{"remap_field": "worker"}"#);

    let output = run(&root, &["--config", "remapres.json", "resolve", "./a"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("./a -> {}", root.join("b.js").display()));
}

#[test]
fn test_version() {
    let output = remapres().arg("version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("remapres "));
}
