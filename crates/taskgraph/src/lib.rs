// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amon-taskgraph: the TaskGraph 2.0 schema, serializer, DAG runtime, and
//! node executor (C6/C7/C8) — a workflow definition of LLM and tool nodes,
//! executed in topological order with per-node retry, timeout, cancellation,
//! and durable run artifacts.

pub mod error;
pub mod llm;
pub mod node_executor;
pub mod runtime;
pub mod schema;
pub mod serialize;

pub use error::TaskGraphError;
pub use llm::{FakeLlmClient, LlmMessage, TaskGraphLlmClient};
pub use node_executor::{extract_output, validate_output, NodeExecutor, NumericAnomaly};
pub use runtime::{CancelToken, NodeState, RunState, TaskGraphRunResult, TaskGraphRuntime};
pub use schema::{
    validate_task_graph, TaskEdge, TaskGraph, TaskNode, TaskNodeGuardrails, TaskNodeLlm, TaskNodeOutput,
    TaskNodeRetry, TaskNodeTimeout, TaskNodeTool, TaskStep,
};
pub use serialize::{dumps_task_graph, loads_task_graph};
