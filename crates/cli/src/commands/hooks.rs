// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amon hooks` — inspect the declarative hook set (C3) without touching
//! the daemon: list loaded hooks, read a hook's durable counter state, and
//! view actions awaiting confirmation.

use amon_daemon::resolve_home_dir;
use anyhow::Result;
use clap::{Args, Subcommand};

use crate::output::OutputFormat;

#[derive(Args)]
pub struct HooksArgs {
    #[command(subcommand)]
    pub command: HooksCommand,
}

#[derive(Subcommand)]
pub enum HooksCommand {
    /// List every hook loaded from `<home>/hooks/*.yaml`
    List,
    /// Show a hook's durable counter state (inflight, last trigger, dedupe)
    State {
        /// Hook id (file stem)
        hook_id: String,
    },
    /// List actions awaiting confirmation in `pending_actions.jsonl`
    Pending,
}

pub fn hooks(args: HooksArgs, format: OutputFormat) -> Result<()> {
    let home = resolve_home_dir(None)?;
    match args.command {
        HooksCommand::List => list(&home, format),
        HooksCommand::State { hook_id } => state(&home, &hook_id, format),
        HooksCommand::Pending => pending(&home, format),
    }
}

fn list(home: &std::path::Path, format: OutputFormat) -> Result<()> {
    let hooks = amon_hooks::load_hooks(&home.join("hooks"));
    match format {
        OutputFormat::Text => {
            if hooks.is_empty() {
                println!("No hooks loaded.");
                return Ok(());
            }
            for hook in &hooks {
                let status = if hook.enabled { "enabled" } else { "disabled" };
                println!(
                    "{:<24} {:<9} {} -> {} {}",
                    hook.hook_id,
                    status,
                    hook.event_types.join(","),
                    hook.action.kind,
                    hook.action.tool.as_deref().unwrap_or("-"),
                );
            }
        }
        OutputFormat::Json => {
            crate::output::print_json(&serde_json::json!({ "hooks": hooks }))?;
        }
    }
    Ok(())
}

fn state(home: &std::path::Path, hook_id: &str, format: OutputFormat) -> Result<()> {
    let store = amon_hooks::HookStateStore::new(amon_hooks::state_path(home));
    let state = store.get_hook_state(hook_id);
    match format {
        OutputFormat::Text => {
            println!("hook_id:           {hook_id}");
            println!("inflight:          {}", state.inflight);
            println!("last_triggered_at: {}", state.last_triggered_at.as_deref().unwrap_or("-"));
            println!("dedupe entries:    {}", state.dedupe.len());
        }
        OutputFormat::Json => {
            crate::output::print_json(&serde_json::json!({ "hook_id": hook_id, "state": state }))?;
        }
    }
    Ok(())
}

fn pending(home: &std::path::Path, format: OutputFormat) -> Result<()> {
    let path = home.join("hooks").join("pending_actions.jsonl");
    let records: Vec<serde_json::Value> = amon_store::read_jsonl(&path).unwrap_or_default();
    match format {
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No pending actions.");
                return Ok(());
            }
            for record in &records {
                println!("{record}");
            }
        }
        OutputFormat::Json => {
            crate::output::print_json(&serde_json::json!({ "pending": records }))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
