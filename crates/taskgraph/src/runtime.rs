// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TaskGraph DAG runtime (C7), grounded in
//! `original_source/src/amon/taskgraph2/runtime.py`.
//!
//! Topologically executes a validated [`TaskGraph`], dispatching each node
//! either to an injected [`TaskGraphLlmClient`] or through an
//! [`amon_tools::ToolRegistry`], persisting `state.json`/`events.jsonl`/
//! `graph.resolved.json` under `<project>/.amon/runs/<run_id>` as it goes.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use amon_core::{Clock, NodeId, RunId};
use amon_tools::{ToolCall, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TaskGraphError;
use crate::llm::{LlmMessage, TaskGraphLlmClient};
use crate::node_executor::NodeExecutor;
use crate::schema::{TaskEdge, TaskGraph, TaskNode};
use crate::serialize::dumps_task_graph;

const ALLOWED_OUTPUT_PREFIXES: [&str; 2] = ["docs/", "audits/"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeState {
    pub status: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub error: Option<String>,
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub error: Option<String>,
    pub variables: BTreeMap<String, Value>,
    pub session: BTreeMap<String, Value>,
    pub nodes: BTreeMap<String, NodeState>,
}

pub struct TaskGraphRunResult {
    pub run_id: RunId,
    pub run_dir: PathBuf,
    pub state: RunState,
}

/// Shared cancellation signal — set by the caller or detected via the
/// presence of `<run_dir>/cancel.json`.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct TaskGraphRuntime<'a> {
    project_path: PathBuf,
    graph: TaskGraph,
    llm_client: Arc<dyn TaskGraphLlmClient>,
    registry: Option<&'a ToolRegistry>,
    clock: &'a dyn Clock,
    run_id: Option<RunId>,
    cancel_token: CancelToken,
}

impl<'a> TaskGraphRuntime<'a> {
    pub fn new(
        project_path: impl Into<PathBuf>,
        graph: TaskGraph,
        llm_client: Arc<dyn TaskGraphLlmClient>,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            graph,
            llm_client,
            registry: None,
            clock,
            run_id: None,
            cancel_token: CancelToken::new(),
        }
    }

    pub fn with_registry(mut self, registry: &'a ToolRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_cancel_token(mut self, cancel_token: CancelToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub async fn run(&self) -> Result<TaskGraphRunResult, TaskGraphError> {
        crate::schema::validate_task_graph(&self.graph)?;

        let run_id = self.run_id.clone().unwrap_or_else(|| RunId::new(uuid::Uuid::new_v4().to_string()));
        let run_dir = self.project_path.join(".amon").join("runs").join(run_id.as_str());
        std::fs::create_dir_all(&run_dir).map_err(|source| amon_store::StoreError::Io {
            path: run_dir.clone(),
            source,
        })?;

        let events_path = run_dir.join("events.jsonl");
        let state_path = run_dir.join("state.json");
        let resolved_path = run_dir.join("graph.resolved.json");
        let cancel_path = run_dir.join("cancel.json");

        let mut state = RunState {
            run_id: run_id.as_str().to_string(),
            status: "running".to_string(),
            started_at: self.clock.now_rfc3339(),
            ended_at: None,
            error: None,
            variables: self.graph.session_defaults.clone(),
            session: self.graph.session_defaults.clone(),
            nodes: self
                .graph
                .nodes
                .iter()
                .map(|node| (node.id.clone(), NodeState::default()))
                .collect(),
        };
        for node_state in state.nodes.values_mut() {
            node_state.status = "pending".to_string();
        }

        self.append_event(&events_path, serde_json::json!({"event": "run_start", "run_id": run_id.as_str()}))?;
        let dumped = dumps_task_graph(&self.graph)?;
        amon_store::atomic_write_text(&resolved_path, &dumped)?;

        let nodes_by_id: BTreeMap<&str, &TaskNode> = self.graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let (adjacency, mut indegree) = build_graph(&self.graph.nodes, &self.graph.edges);

        let outcome = self
            .run_loop(
                &nodes_by_id,
                &adjacency,
                &mut indegree,
                &mut state,
                &events_path,
                &cancel_path,
                &run_id,
            )
            .await;

        if let Err(error) = &outcome {
            if state.status == "running" {
                state.status = "failed".to_string();
                state.ended_at = Some(self.clock.now_rfc3339());
                state.error = Some(error.to_string());
                self.append_event(
                    &events_path,
                    serde_json::json!({"event": "run_failed", "run_id": run_id.as_str(), "error": error.to_string()}),
                )?;
            }
        }

        let persisted = serde_json::to_string_pretty(&state).map_err(|err| TaskGraphError::Invalid(err.to_string()))?;
        amon_store::atomic_write_text(&state_path, &persisted)?;

        outcome?;
        Ok(TaskGraphRunResult { run_id, run_dir, state })
    }

    #[allow(clippy::too_many_arguments, clippy::expect_used)]
    async fn run_loop(
        &self,
        nodes_by_id: &BTreeMap<&str, &TaskNode>,
        adjacency: &BTreeMap<String, Vec<TaskEdge>>,
        indegree: &mut BTreeMap<String, u32>,
        state: &mut RunState,
        events_path: &Path,
        cancel_path: &Path,
        run_id: &RunId,
    ) -> Result<(), TaskGraphError> {
        let mut ready: VecDeque<String> =
            indegree.iter().filter(|(_, count)| **count == 0).map(|(id, _)| id.clone()).collect();
        let mut completed: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();

        while let Some(node_id) = ready.pop_front() {
            if self.cancel_token.is_canceled() || cancel_path.exists() {
                self.cancel_token.cancel();
                state.status = "canceled".to_string();
                state.ended_at = Some(self.clock.now_rfc3339());
                return Ok(());
            }

            let node = nodes_by_id.get(node_id.as_str()).expect("node present by construction");
            let node_state = state.nodes.get_mut(&node_id).expect("node state seeded for every node");
            node_state.status = "running".to_string();
            node_state.started_at = Some(self.clock.now_rfc3339());
            self.append_event(events_path, serde_json::json!({"event": "node_start", "node_id": node_id}))?;

            let dispatch_result = self.execute_node(node, &mut state.session, run_id.as_str(), events_path, cancel_path).await;

            let node_state = state.nodes.get_mut(&node_id).expect("node state seeded for every node");
            match dispatch_result {
                Ok((output_text, output_path)) => {
                    for key in &node.writes {
                        state.session.entry(key.0.clone()).or_insert_with(|| Value::String(output_text.clone()));
                    }
                    state.variables = state.session.clone();

                    let node_state = state.nodes.get_mut(&node_id).expect("node state seeded for every node");
                    node_state.status = "completed".to_string();
                    node_state.ended_at = Some(self.clock.now_rfc3339());
                    node_state.output_path = Some(output_path.clone());
                    self.append_event(
                        events_path,
                        serde_json::json!({"event": "node_complete", "node_id": node_id, "output_path": output_path}),
                    )?;
                    completed.insert(node_id.clone());
                }
                Err(TaskGraphError::Canceled) => {
                    node_state.status = "canceled".to_string();
                    node_state.ended_at = Some(self.clock.now_rfc3339());
                    state.status = "canceled".to_string();
                    state.ended_at = Some(self.clock.now_rfc3339());
                    return Ok(());
                }
                Err(error) => {
                    node_state.status = "failed".to_string();
                    node_state.ended_at = Some(self.clock.now_rfc3339());
                    node_state.error = Some(error.to_string());
                    return Err(error);
                }
            }

            for edge in adjacency.get(&node_id).into_iter().flatten() {
                let count = indegree.get_mut(&edge.to_node).expect("edge target present in indegree map");
                *count -= 1;
                if *count == 0 {
                    ready.push_back(edge.to_node.clone());
                }
            }
        }

        if completed.len() != state.nodes.len() {
            let pending: Vec<String> = state
                .nodes
                .keys()
                .filter(|id| !completed.contains(id.as_str()))
                .cloned()
                .collect();
            return Err(TaskGraphError::Incomplete(pending));
        }

        state.status = "completed".to_string();
        state.ended_at = Some(self.clock.now_rfc3339());
        self.append_event(events_path, serde_json::json!({"event": "run_complete", "run_id": run_id.as_str()}))?;
        Ok(())
    }

    async fn execute_node(
        &self,
        node: &TaskNode,
        session: &mut BTreeMap<String, Value>,
        run_id: &str,
        events_path: &Path,
        cancel_path: &Path,
    ) -> Result<(String, String), TaskGraphError> {
        if uses_tool_execution(node) {
            let output_text = self.execute_tool_node(node, session, run_id, events_path).await?;
            let output_path = self.write_node_output(node, &output_text)?;
            return Ok((output_text, output_path));
        }

        let messages = build_messages(node, session);
        let hard_timeout = Duration::from_secs(node.timeout.hard_s as u64);
        let started = Instant::now();

        let executor = NodeExecutor::new(Duration::ZERO);
        let mut retry_failures: Vec<(u32, String)> = Vec::new();
        let (output_text, _extracted, anomalies) = executor
            .run_llm_with_retry(
                &messages,
                &node.output,
                &node.retry,
                |attempt_messages| self.generate_once(node, attempt_messages, cancel_path, started, hard_timeout),
                |attempt, error| retry_failures.push((attempt, error.to_string())),
            )
            .await?;

        for (attempt, error) in retry_failures {
            if let Err(log_error) = self.append_event(
                events_path,
                serde_json::json!({"event": "node_retry", "node_id": node.id, "attempt": attempt, "error": error}),
            ) {
                tracing::error!(%log_error, node_id = %node.id, "failed to append node_retry event");
            }
        }
        for anomaly in &anomalies {
            if let Err(log_error) = self.append_event(
                events_path,
                serde_json::json!({
                    "event": "node_output_anomaly",
                    "node_id": node.id,
                    "path": anomaly.path,
                    "value": anomaly.value,
                    "reason": anomaly.reason,
                }),
            ) {
                tracing::error!(%log_error, node_id = %node.id, "failed to append node_output_anomaly event");
            }
        }

        let output_path = self.write_node_output(node, &output_text)?;
        Ok((output_text, output_path))
    }

    /// Issues one LLM call for a single retry attempt, polling the cancel
    /// token and the run's `cancel.json` marker every 100 ms and enforcing
    /// `node.timeout.hard_s` against the whole node's wall-clock budget
    /// (not just this attempt), per spec.md §4.7/§5.
    async fn generate_once(
        &self,
        node: &TaskNode,
        messages: Vec<LlmMessage>,
        cancel_path: &Path,
        node_started: Instant,
        hard_timeout: Duration,
    ) -> Result<String, TaskGraphError> {
        let model = node.llm.model.clone();
        let client = Arc::clone(&self.llm_client);
        let mut call = Box::pin(async move { client.generate(&messages, model.as_deref()).await });

        loop {
            if self.cancel_token.is_canceled() || cancel_path.exists() {
                self.cancel_token.cancel();
                return Err(TaskGraphError::Canceled);
            }
            if node_started.elapsed() > hard_timeout.max(Duration::from_secs(1)) {
                return Err(TaskGraphError::Timeout(node.id.clone()));
            }
            match tokio::time::timeout(Duration::from_millis(100), &mut call).await {
                Ok(result) => return result,
                Err(_) => continue,
            }
        }
    }

    async fn execute_tool_node(
        &self,
        node: &TaskNode,
        session: &mut BTreeMap<String, Value>,
        run_id: &str,
        events_path: &Path,
    ) -> Result<String, TaskGraphError> {
        let registry = self.registry.ok_or_else(|| TaskGraphError::ToolFailed("tool dispatcher is not configured".to_string()))?;
        let mut outputs = Vec::new();

        for step in iter_tool_steps(node) {
            let tool_name = step.get("tool_name").and_then(Value::as_str).unwrap_or_default().to_string();
            let args: BTreeMap<String, Value> = step
                .get("args")
                .and_then(Value::as_object)
                .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();

            let mut call = ToolCall::new(tool_name.clone()).with_caller("amon-taskgraph").with_run(amon_core::RunId::new(run_id)).with_node(NodeId::new(node.id.clone()));
            call.args = args.clone();

            self.append_event(
                events_path,
                serde_json::json!({"event": "tool_request", "node_id": node.id, "tool": tool_name, "args": args}),
            )?;

            let result = registry.call(&call, false, self.clock);
            let status = result.status().unwrap_or("ok").to_string();
            self.append_event(
                events_path,
                serde_json::json!({
                    "event": "tool_result",
                    "node_id": node.id,
                    "tool": tool_name,
                    "result": result.content,
                    "meta": {"is_error": result.is_error, "status": status},
                }),
            )?;

            if result.is_error {
                return Err(TaskGraphError::ToolFailed(format!("{tool_name}: {status}")));
            }

            let text = result_as_text(&result.content);
            let key = resolve_store_key(node, &step, &tool_name);
            if let Some(key) = key {
                session.insert(key, Value::String(text.clone()));
            }
            outputs.push(text);
        }

        Ok(outputs.join("\n").trim().to_string())
    }

    fn write_node_output(&self, node: &TaskNode, output_text: &str) -> Result<String, TaskGraphError> {
        let safe_id = amon_store::validate_relative_path(&node.id)?;
        let relative = format!("docs/steps/{safe_id}.md");
        if !ALLOWED_OUTPUT_PREFIXES.iter().any(|prefix| relative.starts_with(prefix)) {
            return Err(TaskGraphError::Invalid(format!("output path not in an allowed prefix: {relative}")));
        }
        let resolved = amon_store::canonicalize_path(&self.project_path, Path::new(&relative), &[])?;
        amon_store::atomic_write_text(&resolved, output_text)?;
        Ok(relative)
    }

    fn append_event(&self, path: &Path, mut payload: Value) -> Result<(), TaskGraphError> {
        if let Value::Object(map) = &mut payload {
            map.insert("timestamp".to_string(), Value::String(self.clock.now_rfc3339()));
        }
        amon_store::append_jsonl(path, &payload)?;
        Ok(())
    }
}

#[allow(clippy::expect_used)]
fn build_graph(nodes: &[TaskNode], edges: &[TaskEdge]) -> (BTreeMap<String, Vec<TaskEdge>>, BTreeMap<String, u32>) {
    let mut indegree: BTreeMap<String, u32> = nodes.iter().map(|n| (n.id.clone(), 0)).collect();
    let mut adjacency: BTreeMap<String, Vec<TaskEdge>> = nodes.iter().map(|n| (n.id.clone(), Vec::new())).collect();
    for edge in edges {
        *indegree.get_mut(&edge.to_node).expect("validated edge target") += 1;
        adjacency.get_mut(&edge.from_node).expect("validated edge source").push(edge.clone());
    }
    (adjacency, indegree)
}

fn build_messages(node: &TaskNode, session: &BTreeMap<String, Value>) -> Vec<LlmMessage> {
    let mut messages = Vec::new();
    if !node.role.trim().is_empty() {
        messages.push(("system".to_string(), node.role.trim().to_string()));
    }

    let mut parts = vec![node.description.trim().to_string()];
    for key in &node.reads {
        if let Some(value) = session.get(key) {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            parts.push(format!("[session:{key}]\n{rendered}"));
        }
    }
    messages.push(("user".to_string(), parts.join("\n\n").trim().to_string()));
    messages
}

fn uses_tool_execution(node: &TaskNode) -> bool {
    !node.steps.is_empty() || (node.kind == "tooling" && !node.tools.is_empty())
}

fn iter_tool_steps(node: &TaskNode) -> Vec<serde_json::Map<String, Value>> {
    if !node.steps.is_empty() {
        return node
            .steps
            .iter()
            .filter(|step| step.get("type").and_then(Value::as_str) == Some("tool"))
            .cloned()
            .collect();
    }
    if node.kind != "tooling" {
        return Vec::new();
    }
    node.tools
        .iter()
        .map(|tool| {
            let mut step = serde_json::Map::new();
            step.insert("type".to_string(), Value::String("tool".to_string()));
            step.insert("tool_name".to_string(), Value::String(tool.name.clone()));
            step.insert("args".to_string(), tool.args_schema_hint.clone().unwrap_or(Value::Object(Default::default())));
            step
        })
        .collect()
}

fn resolve_store_key(node: &TaskNode, step: &serde_json::Map<String, Value>, tool_name: &str) -> Option<String> {
    if let Some(store_as) = step.get("store_as").and_then(Value::as_str) {
        if !store_as.trim().is_empty() {
            return Some(store_as.trim().to_string());
        }
    }
    if node.writes.contains_key(tool_name) {
        return Some(tool_name.to_string());
    }
    if node.writes.len() == 1 {
        return node.writes.keys().next().cloned();
    }
    None
}

fn result_as_text(content: &[Value]) -> String {
    content
        .iter()
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
