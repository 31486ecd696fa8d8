// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn tool_call_hook() -> Hook {
    Hook {
        hook_id: "h1".into(),
        event_types: vec!["file.created".into()],
        filters: HookFilter::default(),
        action: HookAction {
            kind: "tool.call".into(),
            tool: Some("filesystem.read".into()),
            args: BTreeMap::new(),
        },
        policy: HookPolicy::default(),
        enabled: true,
        dedupe_key: None,
        cooldown_seconds: None,
        max_concurrency: None,
    }
}

#[test]
fn validate_accepts_well_formed_hook() {
    assert!(tool_call_hook().validate().is_ok());
}

#[test]
fn validate_rejects_empty_event_types() {
    let mut hook = tool_call_hook();
    hook.event_types.clear();
    assert!(hook.validate().is_err());
}

#[test]
fn validate_rejects_tool_call_without_tool() {
    let mut hook = tool_call_hook();
    hook.action.tool = None;
    assert!(hook.validate().is_err());
}

#[test]
fn validate_rejects_zero_max_concurrency() {
    let mut hook = tool_call_hook();
    hook.max_concurrency = Some(0);
    assert!(hook.validate().is_err());
}

#[test]
fn validate_accepts_graph_run_without_tool() {
    let mut hook = tool_call_hook();
    hook.action.kind = "graph.run".into();
    hook.action.tool = None;
    assert!(hook.validate().is_ok());
}
