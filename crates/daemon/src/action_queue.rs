// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded worker pool executing hook actions asynchronously (C4), grounded
//! in `original_source/src/amon/daemon/queue.py::ActionQueue`.
//!
//! The original's `threading.Thread` worker pool pulling from a
//! `queue.Queue` becomes `tokio::task::JoinSet` workers pulling from a
//! shared `mpsc` receiver: a task that owns a cancel token rather than a
//! thread that checks a flag. The `finally`-block `inflight` decrement
//! becomes a guard type whose `Drop` releases the counter, so a panicking
//! handler or an early `return` during dispatch still lets the hook fire
//! again — no leaked inflight count survives a crashed handler at the
//! single-process level.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use amon_core::{ActionId, EventDraft, EventScope, Risk};
use amon_hooks::HookActionItem;
use amon_taskgraph::{loads_task_graph, CancelToken, TaskGraphLlmClient, TaskGraphRuntime};
use amon_tools::{ToolCall, ToolRegistry};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use crate::context::DaemonContext;

const MIN_TIMEOUT_SECS: u64 = 1;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

pub struct QueuedAction {
    pub action_id: ActionId,
    pub item: HookActionItem,
}

#[derive(Serialize)]
struct TriggerRecord<'a> {
    hook_id: &'a str,
    event_id: &'a str,
    event_type: &'a str,
    created_at: String,
}

/// Single-worker-count-configurable FIFO action queue. Cloning shares the
/// same channel and counters; the underlying workers are spawned once by
/// [`ActionQueue::start`].
#[derive(Clone)]
pub struct ActionQueue {
    sender: mpsc::UnboundedSender<QueuedAction>,
    unfinished: Arc<AtomicI64>,
    stop_token: CancellationToken,
}

impl ActionQueue {
    /// Spawns `worker_count` (minimum 1) tasks pulling from one shared
    /// queue, each dispatching through `ctx`.
    pub fn start(ctx: Arc<DaemonContext>, worker_count: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<QueuedAction>();
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let unfinished = Arc::new(AtomicI64::new(0));
        let stop_token = CancellationToken::new();

        for index in 0..worker_count.max(1) {
            let receiver = Arc::clone(&receiver);
            let ctx = Arc::clone(&ctx);
            let unfinished = Arc::clone(&unfinished);
            let stop_token = stop_token.clone();
            tokio::spawn(async move {
                worker_loop(index, receiver, ctx, unfinished, stop_token).await;
            });
        }

        Self {
            sender,
            unfinished,
            stop_token,
        }
    }

    /// Enqueues `item`, returning a stable, freshly minted [`ActionId`].
    pub fn enqueue_action(&self, action_id_gen: &dyn crate::context::DynIdGen, item: HookActionItem) -> ActionId {
        let action_id = ActionId::new(action_id_gen.next_id());
        self.unfinished.fetch_add(1, Ordering::SeqCst);
        if self
            .sender
            .send(QueuedAction {
                action_id: action_id.clone(),
                item,
            })
            .is_err()
        {
            // Receiver side is gone (queue stopped); undo the optimistic bump.
            self.unfinished.fetch_sub(1, Ordering::SeqCst);
        }
        action_id
    }

    /// Polls the unfinished-action counter until it reaches zero or
    /// `timeout` elapses, mirroring `queue.Queue.unfinished_tasks`.
    pub async fn wait_for_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.unfinished.load(Ordering::SeqCst) <= 0 {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Signals workers to stop once the queue drains; does not forcibly
    /// cancel in-flight work.
    pub fn stop(&self) {
        self.stop_token.cancel();
    }
}

async fn worker_loop(
    _index: usize,
    receiver: Arc<AsyncMutex<mpsc::UnboundedReceiver<QueuedAction>>>,
    ctx: Arc<DaemonContext>,
    unfinished: Arc<AtomicI64>,
    stop_token: CancellationToken,
) {
    loop {
        // Poll with a short timeout, mirroring `queue.Queue.get(timeout=0.5)`
        // in the original worker loop, so the stop signal is noticed even
        // when the queue is idle.
        let received = {
            let mut guard = receiver.lock().await;
            tokio::time::timeout(Duration::from_millis(200), guard.recv()).await
        };
        let queued = match received {
            Ok(Some(queued)) => queued,
            Ok(None) => break,
            Err(_elapsed) => {
                if stop_token.is_cancelled() {
                    break;
                }
                continue;
            }
        };

        let _decrement_guard = InflightDecrementGuard {
            hook_state: Arc::clone(&ctx.hook_state),
            hook_id: queued.item.hook_id.clone(),
        };
        if let Err(error) = execute_action(&ctx, &queued).await {
            tracing::error!(action_id = %queued.action_id, hook_id = %queued.item.hook_id, %error, "action failed");
        }
        unfinished.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Decrements the originating hook's `inflight` counter on drop — the Rust
/// analogue of the Python worker's `finally: self._queue.task_done()` /
/// `hook_state.inflight -= 1`, so panics during dispatch still release it.
/// Intentionally decrement-only: `dispatch_event` already incremented the
/// counter when it queued this action.
struct InflightDecrementGuard {
    hook_state: Arc<amon_hooks::HookStateStore>,
    hook_id: String,
}

impl Drop for InflightDecrementGuard {
    fn drop(&mut self) {
        if let Err(error) = self.hook_state.decrement_inflight(&self.hook_id) {
            tracing::error!(hook_id = %self.hook_id, %error, "failed to decrement hook inflight counter");
        }
    }
}

async fn execute_action(ctx: &Arc<DaemonContext>, queued: &QueuedAction) -> Result<(), crate::error::DaemonError> {
    match queued.item.action_type.as_str() {
        "tool.call" => execute_tool_call(ctx, queued).await,
        "graph.run" => execute_graph_run(ctx, queued).await,
        other => {
            tracing::warn!(action_type = other, "action queue received an action type it does not dispatch");
            Ok(())
        }
    }
}

async fn execute_tool_call(ctx: &Arc<DaemonContext>, queued: &QueuedAction) -> Result<(), crate::error::DaemonError> {
    let Some(tool_name) = queued.item.tool.clone() else {
        tracing::error!(hook_id = %queued.item.hook_id, "tool.call action missing a tool name");
        return Ok(());
    };

    if let Some(spec) = ctx.tool_registry.get_spec(&tool_name) {
        if let Some(schema) = &spec.input_schema {
            if let Err(reason) = validate_tool_args(schema, &queued.item.args) {
                tracing::warn!(tool = %tool_name, hook_id = %queued.item.hook_id, %reason, "tool call args failed schema validation");
                return Ok(());
            }
        }
    }

    let mut call = ToolCall::new(tool_name.clone()).with_caller(format!("hook:{}", queued.item.hook_id));
    call.args = queued.item.args.clone();
    call.event_id = Some(queued.item.event.event_id.clone());
    if let Some(project_id) = &queued.item.event.project_id {
        call.project_id = Some(project_id.clone());
    }

    let timeout = resolve_tool_timeout(&queued.item.args);
    let registry = Arc::clone(&ctx.tool_registry);
    let clock = Arc::clone(&ctx.clock);
    let result = tokio::task::spawn_blocking(move || registry.call(&call, false, clock.as_ref()));
    match tokio::time::timeout(timeout, result).await {
        Ok(Ok(result)) => {
            if result.is_error {
                tracing::warn!(tool = %tool_name, status = ?result.status(), "tool call returned an error result");
            }
        }
        Ok(Err(join_error)) => tracing::error!(tool = %tool_name, %join_error, "tool call task panicked"),
        Err(_) => tracing::error!(tool = %tool_name, "tool call exceeded its timeout"),
    }
    Ok(())
}

/// Derives the per-call tool timeout the way `_resolve_timeout` does: the
/// action's own `timeout_s`/`tool_timeout_s` arg wins, then the
/// `AMON_TOOL_TIMEOUT`/`AMON_TOOL_TIMEOUT_S` env var, then the 60s default,
/// clamped to a minimum of one second.
fn resolve_tool_timeout(args: &BTreeMap<String, Value>) -> Duration {
    let from_args = args
        .get("timeout_s")
        .or_else(|| args.get("tool_timeout_s"))
        .and_then(value_as_timeout_secs);

    let secs = from_args
        .or_else(|| {
            std::env::var("AMON_TOOL_TIMEOUT")
                .ok()
                .or_else(|| std::env::var("AMON_TOOL_TIMEOUT_S").ok())
                .and_then(|raw| raw.parse::<i64>().ok())
        })
        .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS as i64);

    Duration::from_secs(secs.max(MIN_TIMEOUT_SECS as i64) as u64)
}

fn value_as_timeout_secs(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(n) = value.as_f64() {
        return Some(n as i64);
    }
    value.as_str().and_then(|raw| raw.parse::<i64>().ok())
}

async fn execute_graph_run(ctx: &Arc<DaemonContext>, queued: &QueuedAction) -> Result<(), crate::error::DaemonError> {
    let args = &queued.item.args;
    let Some(project_path) = args.get("project_path").and_then(Value::as_str) else {
        tracing::error!(hook_id = %queued.item.hook_id, "graph.run action missing args.project_path");
        return Ok(());
    };
    let Some(graph_path) = args.get("graph_path").and_then(Value::as_str) else {
        tracing::error!(hook_id = %queued.item.hook_id, "graph.run action missing args.graph_path");
        return Ok(());
    };
    let project_path = PathBuf::from(project_path);
    let graph_text = amon_store::read_text(&PathBuf::from(graph_path))?;
    let graph = loads_task_graph(&graph_text)?;

    if !ctx.allow_llm && graph_requires_llm(&graph) {
        tracing::warn!(hook_id = %queued.item.hook_id, graph_path, "graph.run blocked: allow_llm is false and the graph has llm nodes");
        let draft = EventDraft::new("policy.llm_blocked", EventScope::Policy, "amon-daemon")
            .with_payload(BTreeMap::from([
                ("hook_action".to_string(), Value::String("graph.run".to_string())),
                ("graph_path".to_string(), Value::String(graph_path.to_string())),
            ]))
            .with_risk(Risk::Low);
        ctx.emit_event(draft, false);
        return Ok(());
    }

    let run_id = amon_core::RunId::new(ctx.id_gen.next_id());
    let run_dir = project_path.join(".amon").join("runs").join(run_id.as_str());
    std::fs::create_dir_all(&run_dir).map_err(|source| amon_store::StoreError::Io {
        path: run_dir.clone(),
        source,
    })?;
    let trigger = TriggerRecord {
        hook_id: &queued.item.hook_id,
        event_id: queued.item.event.event_id.as_str(),
        event_type: &queued.item.event.kind,
        created_at: ctx.clock.now_rfc3339(),
    };
    amon_store::atomic_write_json(&run_dir.join("trigger.json"), &trigger)?;

    let llm_client: Arc<dyn TaskGraphLlmClient> = Arc::clone(&ctx.llm_client);
    let registry = Arc::clone(&ctx.tool_registry);
    let clock = Arc::clone(&ctx.clock);
    let cancel_token = CancelToken::new();

    let runtime = TaskGraphRuntime::new(project_path, graph, llm_client, clock.as_ref())
        .with_registry(registry.as_ref())
        .with_run_id(run_id.clone())
        .with_cancel_token(cancel_token);
    match runtime.run().await {
        Ok(result) => {
            let draft = EventDraft::new("graph.run_complete", EventScope::Project, "amon-daemon")
                .with_payload(BTreeMap::from([
                    ("run_id".to_string(), Value::String(result.run_id.as_str().to_string())),
                    ("status".to_string(), Value::String(result.state.status.clone())),
                ]))
                .with_risk(Risk::Low);
            ctx.emit_event(draft, false);
        }
        Err(error) => {
            tracing::error!(run_id = %run_id, %error, "graph.run action failed");
        }
    }
    Ok(())
}

/// Minimal object/required/types check against a JSON-schema-subset
/// `input_schema`: validates args against the tool's declared required
/// fields and per-field types. Unknown type aliases and fields outside
/// `properties` are accepted rather than rejected.
fn validate_tool_args(schema: &Value, args: &BTreeMap<String, Value>) -> Result<(), String> {
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return check_property_types(schema, args);
    };
    for key in required {
        let Some(key) = key.as_str() else { continue };
        if !args.contains_key(key) {
            return Err(format!("missing required argument: {key}"));
        }
    }
    check_property_types(schema, args)
}

fn check_property_types(schema: &Value, args: &BTreeMap<String, Value>) -> Result<(), String> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in args {
        let Some(expected) = properties.get(key).and_then(|p| p.get("type")).and_then(Value::as_str) else {
            continue;
        };
        if !value_matches_type(value, expected) {
            return Err(format!("argument {key} does not match declared type {expected}"));
        }
    }
    Ok(())
}

/// A graph "requires LLM" if it has any node whose kind is not pure tool
/// execution, mirroring `_guard_llm_policy`'s `node.type == "agent_task"`
/// check (the schema here calls that kind anything other than `"tooling"`).
fn graph_requires_llm(graph: &amon_taskgraph::TaskGraph) -> bool {
    graph.nodes.iter().any(|node| node.kind != "tooling")
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
#[path = "action_queue_tests.rs"]
mod tests;
