// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TaskGraph 2.0 schema types and structural validation (C6), grounded in
//! `original_source/src/amon/taskgraph2/schema.py`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TaskGraphError;

const ALLOWED_OUTPUT_TYPES: [&str; 4] = ["json", "md", "text", "artifact"];
const ALLOWED_EXTRACT_MODES: [&str; 2] = ["strict", "best_effort"];

fn default_true() -> bool {
    true
}

fn default_output_type() -> String {
    "text".to_string()
}

fn default_extract_mode() -> String {
    "best_effort".to_string()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff_s() -> f64 {
    1.0
}

fn default_inactivity_s() -> u32 {
    60
}

fn default_hard_s() -> u32 {
    300
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskNodeLlm {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub tool_choice: Option<String>,
    #[serde(default)]
    pub enable_tools: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskNodeTool {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub when_to_use: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub args_schema_hint: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskNodeOutput {
    #[serde(default = "default_output_type")]
    pub r#type: String,
    #[serde(default = "default_extract_mode")]
    pub extract: String,
    #[serde(default)]
    pub schema: Option<Value>,
}

impl Default for TaskNodeOutput {
    fn default() -> Self {
        Self {
            r#type: default_output_type(),
            extract: default_extract_mode(),
            schema: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskNodeGuardrails {
    #[serde(default = "default_true")]
    pub allow_interrupt: bool,
    #[serde(default)]
    pub require_human_approval: bool,
    #[serde(default)]
    pub boundaries: Vec<String>,
}

impl Default for TaskNodeGuardrails {
    fn default() -> Self {
        Self {
            allow_interrupt: true,
            require_human_approval: false,
            boundaries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskNodeRetry {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_s")]
    pub backoff_s: f64,
    #[serde(default)]
    pub jitter_s: f64,
}

impl Default for TaskNodeRetry {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_s: default_backoff_s(),
            jitter_s: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskNodeTimeout {
    #[serde(default = "default_inactivity_s")]
    pub inactivity_s: u32,
    #[serde(default = "default_hard_s")]
    pub hard_s: u32,
}

impl Default for TaskNodeTimeout {
    fn default() -> Self {
        Self {
            inactivity_s: default_inactivity_s(),
            hard_s: default_hard_s(),
        }
    }
}

/// A single step within `node.steps` — kept as a loosely-typed JSON object
/// (rather than an enum) since the original tolerates unknown extra keys and
/// only a handful of fields (`type`, `tool_name`, `args`, `store_as`) are
/// interpreted by the runtime.
pub type TaskStep = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub reads: Vec<String>,
    #[serde(default)]
    pub writes: BTreeMap<String, String>,
    #[serde(default)]
    pub llm: TaskNodeLlm,
    #[serde(default)]
    pub tools: Vec<TaskNodeTool>,
    #[serde(default)]
    pub steps: Vec<TaskStep>,
    #[serde(default)]
    pub output: TaskNodeOutput,
    #[serde(default)]
    pub guardrails: TaskNodeGuardrails,
    #[serde(default)]
    pub retry: TaskNodeRetry,
    #[serde(default)]
    pub timeout: TaskNodeTimeout,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskEdge {
    #[serde(rename = "from")]
    pub from_node: String,
    #[serde(rename = "to")]
    pub to_node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskGraph {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub session_defaults: BTreeMap<String, Value>,
    #[serde(default)]
    pub nodes: Vec<TaskNode>,
    #[serde(default)]
    pub edges: Vec<TaskEdge>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, Value>>,
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self {
            schema_version: "2.0".to_string(),
            objective: String::new(),
            session_defaults: BTreeMap::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: None,
        }
    }
}

pub fn validate_task_graph(graph: &TaskGraph) -> Result<(), TaskGraphError> {
    if graph.schema_version != "2.0" {
        return Err(TaskGraphError::Invalid(format!(
            "unsupported schema_version: {}",
            graph.schema_version
        )));
    }
    if graph.objective.trim().is_empty() {
        return Err(TaskGraphError::Invalid("objective must be non-empty".to_string()));
    }
    if graph.nodes.is_empty() {
        return Err(TaskGraphError::Invalid("nodes must be non-empty".to_string()));
    }

    let mut seen = BTreeSet::new();
    for node in &graph.nodes {
        validate_node(node)?;
        if !seen.insert(node.id.clone()) {
            return Err(TaskGraphError::Invalid(format!("duplicate node id: {}", node.id)));
        }
    }

    for edge in &graph.edges {
        if !seen.contains(&edge.from_node) {
            return Err(TaskGraphError::Invalid(format!("edge references unknown node: {}", edge.from_node)));
        }
        if !seen.contains(&edge.to_node) {
            return Err(TaskGraphError::Invalid(format!("edge references unknown node: {}", edge.to_node)));
        }
    }

    ensure_dag(&graph.nodes, &graph.edges)
}

fn validate_node(node: &TaskNode) -> Result<(), TaskGraphError> {
    if node.id.trim().is_empty() {
        return Err(TaskGraphError::Invalid("node.id must be non-empty".to_string()));
    }
    if node.title.trim().is_empty() {
        return Err(TaskGraphError::Invalid(format!("node {}: title must be non-empty", node.id)));
    }
    if node.kind.trim().is_empty() {
        return Err(TaskGraphError::Invalid(format!("node {}: kind must be non-empty", node.id)));
    }
    if node.description.trim().is_empty() {
        return Err(TaskGraphError::Invalid(format!("node {}: description must be non-empty", node.id)));
    }

    for step in &node.steps {
        let step_type = step.get("type").and_then(Value::as_str).unwrap_or_default();
        if step_type != "tool" && step_type != "llm" {
            return Err(TaskGraphError::Invalid(format!(
                "node {}: step.type must be 'tool' or 'llm', got {step_type:?}"
            )));
        }
        if step_type == "tool" {
            let tool_name = step.get("tool_name").and_then(Value::as_str).unwrap_or_default();
            if tool_name.trim().is_empty() {
                return Err(TaskGraphError::Invalid(format!(
                    "node {}: tool step requires a non-empty tool_name",
                    node.id
                )));
            }
        }
    }

    if !ALLOWED_OUTPUT_TYPES.contains(&node.output.r#type.as_str()) {
        return Err(TaskGraphError::Invalid(format!(
            "node {}: output.type must be one of {ALLOWED_OUTPUT_TYPES:?}, got {}",
            node.id, node.output.r#type
        )));
    }
    if !ALLOWED_EXTRACT_MODES.contains(&node.output.extract.as_str()) {
        return Err(TaskGraphError::Invalid(format!(
            "node {}: output.extract must be one of {ALLOWED_EXTRACT_MODES:?}, got {}",
            node.id, node.output.extract
        )));
    }

    if node.retry.max_attempts == 0 {
        return Err(TaskGraphError::Invalid(format!("node {}: retry.max_attempts must be > 0", node.id)));
    }
    if node.retry.backoff_s <= 0.0 {
        return Err(TaskGraphError::Invalid(format!("node {}: retry.backoff_s must be > 0", node.id)));
    }
    if node.retry.jitter_s < 0.0 {
        return Err(TaskGraphError::Invalid(format!("node {}: retry.jitter_s must be >= 0", node.id)));
    }

    if node.timeout.inactivity_s == 0 {
        return Err(TaskGraphError::Invalid(format!("node {}: timeout.inactivity_s must be > 0", node.id)));
    }
    if node.timeout.hard_s == 0 {
        return Err(TaskGraphError::Invalid(format!("node {}: timeout.hard_s must be > 0", node.id)));
    }

    Ok(())
}

#[allow(clippy::expect_used)]
fn ensure_dag(nodes: &[TaskNode], edges: &[TaskEdge]) -> Result<(), TaskGraphError> {
    let mut indegree: BTreeMap<&str, u32> = nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adjacency: BTreeMap<&str, Vec<&str>> = nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();

    for edge in edges {
        *indegree.get_mut(edge.to_node.as_str()).expect("edge target validated above") += 1;
        adjacency
            .get_mut(edge.from_node.as_str())
            .expect("edge source validated above")
            .push(edge.to_node.as_str());
    }

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0usize;

    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        if let Some(targets) = adjacency.get(node_id) {
            for target in targets {
                let count = indegree.get_mut(target).expect("target present in indegree map");
                *count -= 1;
                if *count == 0 {
                    queue.push_back(target);
                }
            }
        }
    }

    if visited != nodes.len() {
        return Err(TaskGraphError::Invalid("TaskGraph contains a cycle, not a DAG".to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
