// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn minimal_node(id: &str) -> TaskNode {
    TaskNode {
        id: id.to_string(),
        title: "Title".to_string(),
        kind: "llm".to_string(),
        description: "Do the thing".to_string(),
        ..Default::default()
    }
}

fn minimal_graph() -> TaskGraph {
    TaskGraph {
        objective: "ship the feature".to_string(),
        nodes: vec![minimal_node("a")],
        ..Default::default()
    }
}

#[test]
fn minimal_graph_is_valid() {
    assert!(validate_task_graph(&minimal_graph()).is_ok());
}

#[test]
fn rejects_wrong_schema_version() {
    let mut graph = minimal_graph();
    graph.schema_version = "1.0".to_string();
    assert!(matches!(validate_task_graph(&graph), Err(TaskGraphError::Invalid(_))));
}

#[test]
fn rejects_empty_objective() {
    let mut graph = minimal_graph();
    graph.objective = "  ".to_string();
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_empty_nodes() {
    let mut graph = minimal_graph();
    graph.nodes.clear();
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_duplicate_node_ids() {
    let mut graph = minimal_graph();
    graph.nodes.push(minimal_node("a"));
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_edge_to_unknown_node() {
    let mut graph = minimal_graph();
    graph.edges.push(TaskEdge {
        from_node: "a".to_string(),
        to_node: "missing".to_string(),
        when: None,
    });
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_cycles() {
    let mut graph = minimal_graph();
    graph.nodes.push(minimal_node("b"));
    graph.edges.push(TaskEdge { from_node: "a".to_string(), to_node: "b".to_string(), when: None });
    graph.edges.push(TaskEdge { from_node: "b".to_string(), to_node: "a".to_string(), when: None });
    let err = validate_task_graph(&graph).unwrap_err();
    assert!(matches!(err, TaskGraphError::Invalid(msg) if msg.contains("cycle")));
}

#[test]
fn accepts_a_diamond_dag() {
    let mut graph = minimal_graph();
    graph.nodes = vec![minimal_node("a"), minimal_node("b"), minimal_node("c"), minimal_node("d")];
    graph.edges = vec![
        TaskEdge { from_node: "a".to_string(), to_node: "b".to_string(), when: None },
        TaskEdge { from_node: "a".to_string(), to_node: "c".to_string(), when: None },
        TaskEdge { from_node: "b".to_string(), to_node: "d".to_string(), when: None },
        TaskEdge { from_node: "c".to_string(), to_node: "d".to_string(), when: None },
    ];
    assert!(validate_task_graph(&graph).is_ok());
}

#[test]
fn rejects_tool_step_without_tool_name() {
    let mut graph = minimal_graph();
    let mut step = serde_json::Map::new();
    step.insert("type".to_string(), serde_json::json!("tool"));
    graph.nodes[0].steps.push(step);
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_unknown_step_type() {
    let mut graph = minimal_graph();
    let mut step = serde_json::Map::new();
    step.insert("type".to_string(), serde_json::json!("shell"));
    graph.nodes[0].steps.push(step);
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_bad_output_type() {
    let mut graph = minimal_graph();
    graph.nodes[0].output.r#type = "xml".to_string();
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_bad_extract_mode() {
    let mut graph = minimal_graph();
    graph.nodes[0].output.extract = "lenient".to_string();
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_zero_retry_attempts() {
    let mut graph = minimal_graph();
    graph.nodes[0].retry.max_attempts = 0;
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_negative_jitter() {
    let mut graph = minimal_graph();
    graph.nodes[0].retry.jitter_s = -1.0;
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn rejects_zero_timeouts() {
    let mut graph = minimal_graph();
    graph.nodes[0].timeout.hard_s = 0;
    assert!(validate_task_graph(&graph).is_err());
}

#[test]
fn node_defaults_match_the_original() {
    let node = TaskNode::default();
    assert_eq!(node.output.r#type, "text");
    assert_eq!(node.output.extract, "best_effort");
    assert!(node.guardrails.allow_interrupt);
    assert!(!node.guardrails.require_human_approval);
    assert_eq!(node.retry.max_attempts, 1);
    assert_eq!(node.timeout.inactivity_s, 60);
    assert_eq!(node.timeout.hard_s, 300);
}
