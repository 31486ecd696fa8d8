// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Matches an event against loaded hooks and turns each match into either a
//! queueable action item or a pending-confirmation record, grounded in
//! `original_source/src/amon/hooks/runner.py::process_event`.
//!
//! The action queue itself (C4) lives in `amon-daemon`; this module stops at
//! producing [`HookActionItem`]s plus the bookkeeping (`inflight` increment,
//! `last_triggered_at`/dedupe recording) the matcher depends on for
//! subsequent events.

use std::collections::BTreeMap;
use std::path::Path;

use amon_core::{Clock, Event};
use serde::Serialize;
use serde_json::Value;

use crate::error::HookError;
use crate::matcher::{dedupe_key_for, match_hooks};
use crate::state::HookStateStore;
use crate::template::render_template;
use crate::types::Hook;

/// A matched, template-rendered action ready to be handed to the action
/// queue. Carries the triggering event so the worker can both execute the
/// action and log its lineage.
#[derive(Debug, Clone)]
pub struct HookActionItem {
    pub hook_id: String,
    pub action_type: String,
    pub tool: Option<String>,
    pub args: BTreeMap<String, Value>,
    pub event: Event,
}

#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// `require_confirm` hooks: the action was appended to
    /// `pending_actions.jsonl` rather than queued.
    Pending { hook_id: String },
    /// A `tool.call`/`graph.run` action is ready for the caller to enqueue.
    Queued {
        hook_id: String,
        item: HookActionItem,
    },
    /// The hook's action type is not one the dispatcher understands.
    Skipped { hook_id: String, reason: String },
    /// `inflight` bookkeeping failed before the action could be queued.
    Failed { hook_id: String, error: String },
}

#[derive(Serialize)]
struct PendingActionRecord<'a> {
    hook_id: &'a str,
    event_id: &'a str,
    event_type: &'a str,
    action: PendingAction<'a>,
    status: &'static str,
    created_at: String,
}

#[derive(Serialize)]
struct PendingAction<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    tool: &'a Option<String>,
    args: &'a BTreeMap<String, Value>,
}

fn render_args(raw: &BTreeMap<String, Value>, event: &Event) -> BTreeMap<String, Value> {
    raw.iter()
        .map(|(k, v)| (k.clone(), render_template(v, event)))
        .collect()
}

fn append_pending_action(
    hooks_dir: &Path,
    hook: &Hook,
    event: &Event,
    args: &BTreeMap<String, Value>,
    clock: &dyn Clock,
) -> Result<(), HookError> {
    let record = PendingActionRecord {
        hook_id: &hook.hook_id,
        event_id: event.event_id.as_str(),
        event_type: &event.kind,
        action: PendingAction {
            kind: &hook.action.kind,
            tool: &hook.action.tool,
            args,
        },
        status: "pending",
        created_at: clock.now_rfc3339(),
    };
    amon_store::append_jsonl(&hooks_dir.join("pending_actions.jsonl"), &record).map_err(HookError::from)
}

/// Matches `event` against `hooks`, rendering each matched hook's action
/// arguments and recording trigger/dedupe state. `hooks_dir` is where
/// `pending_actions.jsonl` lives for `require_confirm` hooks.
pub fn dispatch_event(
    event: &Event,
    hooks: &[Hook],
    clock: &dyn Clock,
    state_store: &HookStateStore,
    hooks_dir: &Path,
) -> Vec<DispatchOutcome> {
    let mut outcomes = Vec::new();

    for hook in match_hooks(event, hooks, clock, state_store) {
        let args = render_args(&hook.action.args, event);
        let dedupe_key = dedupe_key_for(&hook, event);
        let now = clock.now_rfc3339();

        if hook.policy.require_confirm {
            if let Err(error) = append_pending_action(hooks_dir, &hook, event, &args, clock) {
                outcomes.push(DispatchOutcome::Failed {
                    hook_id: hook.hook_id.clone(),
                    error: error.to_string(),
                });
                continue;
            }
            let _ = state_store.record_trigger(&hook.hook_id, &now, dedupe_key.as_deref());
            outcomes.push(DispatchOutcome::Pending {
                hook_id: hook.hook_id.clone(),
            });
            continue;
        }

        match hook.action.kind.as_str() {
            "tool.call" | "graph.run" => {
                if let Err(error) = state_store.increment_inflight(&hook.hook_id) {
                    outcomes.push(DispatchOutcome::Failed {
                        hook_id: hook.hook_id.clone(),
                        error: error.to_string(),
                    });
                    continue;
                }
                let _ = state_store.record_trigger(&hook.hook_id, &now, dedupe_key.as_deref());
                outcomes.push(DispatchOutcome::Queued {
                    hook_id: hook.hook_id.clone(),
                    item: HookActionItem {
                        hook_id: hook.hook_id.clone(),
                        action_type: hook.action.kind.clone(),
                        tool: hook.action.tool.clone(),
                        args,
                        event: event.clone(),
                    },
                });
            }
            other => outcomes.push(DispatchOutcome::Skipped {
                hook_id: hook.hook_id.clone(),
                reason: format!("unsupported action type: {other}"),
            }),
        }
    }

    outcomes
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
