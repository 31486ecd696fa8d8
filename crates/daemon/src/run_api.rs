// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run API surface (C12): `start_run`/`status_run`/`cancel_run`, the
//! synchronous operator-facing entry points `amon-cli`'s `run` subcommands
//! call directly, grounded in
//! `original_source/src/amon/taskgraph2/runtime.py`'s `cancel.json` polling
//! contract.
//!
//! Project registry/slug resolution (`amon.project_id` → on-disk path) is
//! out of scope here — callers pass the project's
//! filesystem path directly rather than an opaque project id.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use amon_core::RunId;
use amon_taskgraph::{loads_task_graph, CancelToken, RunState, TaskGraphRuntime};
use parking_lot::Mutex;
use serde_json::Value;

use crate::context::DaemonContext;
use crate::error::DaemonError;

/// Tracks cancel tokens for runs started in this process. A run cancelled
/// via `cancel_run` after this process exits still works: `cancel_run`
/// always also writes `cancel.json`, which a resumed/still-running runtime
/// polls regardless of which process started it.
pub struct RunApi {
    ctx: Arc<DaemonContext>,
    in_process: Mutex<BTreeMap<String, CancelToken>>,
}

impl RunApi {
    pub fn new(ctx: Arc<DaemonContext>) -> Self {
        Self {
            ctx,
            in_process: Mutex::new(BTreeMap::new()),
        }
    }

    /// Loads and validates the graph at `graph_path`, then spawns it in the
    /// background and returns its `run_id` immediately — non-blocking.
    pub fn start_run(
        &self,
        project_path: PathBuf,
        graph_path: &Path,
        variables: BTreeMap<String, Value>,
    ) -> Result<RunId, DaemonError> {
        let graph_text = amon_store::read_text(graph_path)?;
        let mut graph = loads_task_graph(&graph_text)?;
        graph.session_defaults.extend(variables);

        let run_id = RunId::new(self.ctx.id_gen.next_id());
        let cancel_token = CancelToken::new();
        self.in_process
            .lock()
            .insert(run_id.as_str().to_string(), cancel_token.clone());

        let ctx = Arc::clone(&self.ctx);
        let spawned_run_id = run_id.clone();
        tokio::spawn(async move {
            let llm_client = Arc::clone(&ctx.llm_client);
            let registry = Arc::clone(&ctx.tool_registry);
            let clock = Arc::clone(&ctx.clock);
            let runtime = TaskGraphRuntime::new(project_path, graph, llm_client, clock.as_ref())
                .with_registry(registry.as_ref())
                .with_run_id(spawned_run_id.clone())
                .with_cancel_token(cancel_token);
            if let Err(error) = runtime.run().await {
                tracing::error!(run_id = %spawned_run_id, %error, "run failed");
            }
        });

        Ok(run_id)
    }

    /// Reads `<project_path>/.amon/runs/<run_id>/state.json`.
    pub fn status_run(&self, project_path: &Path, run_id: &str) -> Result<RunState, DaemonError> {
        let path = run_state_path(project_path, run_id);
        if !path.exists() {
            return Err(DaemonError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let text = amon_store::read_text(&path)?;
        let state = serde_json::from_str(&text).map_err(|source| amon_store::StoreError::Json {
            path: path.clone(),
            source,
        })?;
        Ok(state)
    }

    /// Writes `cancel.json` atomically and, if this process started the
    /// run, also flips its in-memory cancel token for a faster response.
    pub fn cancel_run(&self, project_path: &Path, run_id: &str) -> Result<(), DaemonError> {
        let run_dir = run_dir_path(project_path, run_id);
        if !run_dir.exists() {
            return Err(DaemonError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        amon_store::atomic_write_json(&run_dir.join("cancel.json"), &serde_json::json!({"canceled": true}))?;
        if let Some(token) = self.in_process.lock().get(run_id) {
            token.cancel();
        }
        Ok(())
    }
}

fn run_dir_path(project_path: &Path, run_id: &str) -> PathBuf {
    project_path.join(".amon").join("runs").join(run_id)
}

fn run_state_path(project_path: &Path, run_id: &str) -> PathBuf {
    run_dir_path(project_path, run_id).join("state.json")
}

#[cfg(test)]
#[path = "run_api_tests.rs"]
mod tests;
