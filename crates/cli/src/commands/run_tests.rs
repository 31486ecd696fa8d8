// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use tempfile::tempdir;

use crate::output::OutputFormat;

const GRAPH_JSON: &str = r#"{
  "schema_version": "2.0",
  "objective": "say hello",
  "nodes": [
    {"id": "n1", "title": "Greet", "description": "say hi"}
  ],
  "edges": []
}"#;

#[tokio::test]
async fn start_runs_a_single_node_graph_to_completion() {
    let project = tempdir().unwrap();
    let graph_dir = tempdir().unwrap();
    let graph_path = graph_dir.path().join("graph.json");
    std::fs::write(&graph_path, GRAPH_JSON).unwrap();

    super::start(project.path().to_path_buf(), &graph_path, Vec::new(), OutputFormat::Text)
        .await
        .unwrap();

    let runs_dir = project.path().join(".amon").join("runs");
    let entries: Vec<_> = std::fs::read_dir(&runs_dir).unwrap().collect();
    assert_eq!(entries.len(), 1, "expected exactly one run directory");
}

#[test]
fn parse_key_value_splits_on_first_equals() {
    let (k, v) = super::parse_key_value("key=value=with=equals").unwrap();
    assert_eq!(k, "key");
    assert_eq!(v, "value=with=equals");
}

#[test]
fn parse_key_value_rejects_missing_equals() {
    assert!(super::parse_key_value("no-equals-here").is_err());
}

#[test]
fn status_errors_on_unknown_run() {
    let project = tempdir().unwrap();
    let err = super::status(project.path(), "does-not-exist", OutputFormat::Text).unwrap_err();
    assert!(err.to_string().contains("does-not-exist") || err.to_string().to_lowercase().contains("not found"));
}
