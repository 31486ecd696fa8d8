// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amon run` — the operator-facing entry points for C12's Run API.
//!
//! `start` intentionally does not reuse `amon_daemon::RunApi::start_run`'s
//! `tokio::spawn`-and-return-immediately shape: that non-blocking contract
//! only makes sense with a long-lived process keeping the
//! spawned task alive. A one-shot CLI invocation has no such process, so
//! `amon run start` builds the same `TaskGraphRuntime` and awaits it to
//! completion before the process exits — `status`/`cancel` still go through
//! `RunApi` since those only touch durable on-disk state.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use amon_core::SystemClock;
use amon_daemon::RunApi;
use amon_taskgraph::{loads_task_graph, FakeLlmClient, TaskGraphRuntime};
use amon_tools::{ToolPolicy, ToolRegistry};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::output::OutputFormat;

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// Validate, run, and persist a TaskGraph to completion
    Start {
        /// Project directory (runs land under `<project>/.amon/runs/<run_id>`)
        #[arg(long)]
        project: PathBuf,
        /// Path to the TaskGraph JSON file
        graph: PathBuf,
        /// Seed a session_defaults entry: `--var key=value` (repeatable)
        #[arg(long = "var", value_parser = parse_key_value)]
        var: Vec<(String, String)>,
    },
    /// Print `<project>/.amon/runs/<run_id>/state.json`
    Status {
        #[arg(long)]
        project: PathBuf,
        run_id: String,
    },
    /// Write `cancel.json` for a run
    Cancel {
        #[arg(long)]
        project: PathBuf,
        run_id: String,
    },
}

pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) => Ok((k.to_string(), v.to_string())),
        None => Err(format!("expected key=value, got '{s}'")),
    }
}

pub async fn run(args: RunArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        RunCommand::Start { project, graph, var } => start(project, &graph, var, format).await,
        RunCommand::Status { project, run_id } => status(&project, &run_id, format),
        RunCommand::Cancel { project, run_id } => cancel(&project, &run_id, format),
    }
}

async fn start(project: PathBuf, graph_path: &std::path::Path, vars: Vec<(String, String)>, format: OutputFormat) -> Result<()> {
    let text = amon_store::read_text(graph_path)?;
    let mut graph = loads_task_graph(&text)?;
    let variables: BTreeMap<String, Value> = vars
        .into_iter()
        .map(|(k, v)| (k, serde_json::from_str(&v).unwrap_or(Value::String(v))))
        .collect();
    graph.session_defaults.extend(variables);

    let clock = SystemClock;
    let registry = ToolRegistry::new(ToolPolicy::with_default_policy());
    let llm_client: Arc<dyn amon_taskgraph::TaskGraphLlmClient> = Arc::new(FakeLlmClient::always_returning(""));

    let runtime = TaskGraphRuntime::new(project, graph, llm_client, &clock).with_registry(&registry);
    let result = runtime.run().await?;

    match format {
        OutputFormat::Text => {
            println!("run_id: {}", result.run_id.as_str());
            println!("status: {}", result.state.status);
            println!("run_dir: {}", result.run_dir.display());
        }
        OutputFormat::Json => {
            crate::output::print_json(&serde_json::json!({
                "run_id": result.run_id.as_str(),
                "status": result.state.status,
                "run_dir": result.run_dir,
            }))?;
        }
    }

    if result.state.status == "failed" {
        return Err(anyhow!("run {} failed: {}", result.run_id.as_str(), result.state.error.unwrap_or_default()));
    }
    Ok(())
}

fn status(project: &std::path::Path, run_id: &str, format: OutputFormat) -> Result<()> {
    let api = build_run_api();
    let state = api.status_run(project, run_id)?;
    match format {
        OutputFormat::Text => {
            println!("run_id: {}", state.run_id);
            println!("status: {}", state.status);
            for (node_id, node) in &state.nodes {
                println!("  {node_id}: {}", node.status);
            }
        }
        OutputFormat::Json => crate::output::print_json(&serde_json::to_value(&state)?)?,
    }
    Ok(())
}

fn cancel(project: &std::path::Path, run_id: &str, format: OutputFormat) -> Result<()> {
    let api = build_run_api();
    api.cancel_run(project, run_id)?;
    match format {
        OutputFormat::Text => println!("run {run_id} marked for cancellation"),
        OutputFormat::Json => crate::output::print_json(&serde_json::json!({ "run_id": run_id, "status": "canceled" }))?,
    }
    Ok(())
}

/// `status`/`cancel` only need `RunApi` for its durable on-disk reads and
/// the `cancel.json` write, so a throwaway context rooted at the resolved
/// Amon home is enough — no in-process cancel token to wire up here.
fn build_run_api() -> RunApi {
    let home = amon_daemon::resolve_home_dir(None).unwrap_or_else(|_| PathBuf::from(".amon"));
    let config = amon_daemon::GlobalConfig::default();
    let ctx = Arc::new(amon_daemon::DaemonContext::bootstrap(home, config));
    RunApi::new(ctx)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
