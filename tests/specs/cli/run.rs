//! `amon run` end-to-end specs: drive a TaskGraph through the real binary.

use crate::prelude::*;
use std::fs;

const GRAPH_JSON: &str = r#"{
  "schema_version": "2.0",
  "objective": "say hello",
  "nodes": [
    {"id": "n1", "title": "Greet", "description": "say hi"}
  ],
  "edges": []
}"#;

#[test]
fn start_runs_a_single_node_graph_and_prints_run_id() {
    let project = tempfile::tempdir().expect("tempdir");
    let graph_path = project.path().join("graph.json");
    fs::write(&graph_path, GRAPH_JSON).expect("write graph");

    cli()
        .args(&["run", "start", "--project"])
        .args(&[project.path().to_str().expect("utf8 path")])
        .args(&[graph_path.to_str().expect("utf8 path")])
        .passes()
        .stdout_has("run_id:");
}

#[test]
fn status_on_unknown_run_fails() {
    let project = tempfile::tempdir().expect("tempdir");

    cli()
        .args(&["run", "status", "--project"])
        .args(&[project.path().to_str().expect("utf8 path")])
        .args(&["does-not-exist"])
        .fails()
        .stderr_has("not found");
}

#[test]
fn start_with_invalid_graph_json_fails() {
    let project = tempfile::tempdir().expect("tempdir");
    let graph_path = project.path().join("graph.json");
    fs::write(&graph_path, "not json").expect("write graph");

    cli()
        .args(&["run", "start", "--project"])
        .args(&[project.path().to_str().expect("utf8 path")])
        .args(&[graph_path.to_str().expect("utf8 path")])
        .fails();
}
