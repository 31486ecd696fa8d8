// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use amon_core::FakeClock;
use tempfile::tempdir;

fn echo_handler() -> ToolHandler {
    Box::new(|_call| ToolResult::ok(vec![serde_json::json!({"type": "text", "text": "ok"})]))
}

#[test]
fn unknown_tool_is_denied_with_unknown_source() {
    let registry = ToolRegistry::new(ToolPolicy::default());
    let clock = FakeClock::new();
    let result = registry.call(&ToolCall::new("ghost.tool"), false, &clock);
    assert!(result.is_error);
    assert_eq!(result.status(), Some("unknown_tool"));
}

#[test]
fn denied_tool_returns_denied_status() {
    let mut registry = ToolRegistry::new(ToolPolicy::new(vec![], vec![], vec!["filesystem.delete".into()]));
    registry.register(ToolSpec::new("filesystem.delete"), echo_handler());
    let clock = FakeClock::new();
    let result = registry.call(&ToolCall::new("filesystem.delete"), false, &clock);
    assert!(result.is_error);
    assert_eq!(result.status(), Some("denied"));
}

#[test]
fn ask_without_approval_flag_is_not_approved() {
    let mut registry = ToolRegistry::new(ToolPolicy::new(vec![], vec!["filesystem.write".into()], vec![]));
    registry.register(ToolSpec::new("filesystem.write"), echo_handler());
    let clock = FakeClock::new();
    let result = registry.call(&ToolCall::new("filesystem.write"), false, &clock);
    assert_eq!(result.status(), Some("approval_missing"));
}

#[test]
fn ask_with_require_approval_asks_for_approval() {
    let mut registry = ToolRegistry::new(ToolPolicy::new(vec![], vec!["filesystem.write".into()], vec![]));
    registry.register(ToolSpec::new("filesystem.write"), echo_handler());
    let clock = FakeClock::new();
    let result = registry.call(&ToolCall::new("filesystem.write"), true, &clock);
    assert_eq!(result.status(), Some("approval_required"));
}

#[test]
fn allowed_tool_runs_handler() {
    let mut registry = ToolRegistry::new(ToolPolicy::new(vec!["filesystem.read".into()], vec![], vec![]));
    registry.register(ToolSpec::new("filesystem.read"), echo_handler());
    let clock = FakeClock::new();
    let result = registry.call(&ToolCall::new("filesystem.read"), false, &clock);
    assert!(!result.is_error);
}

#[test]
fn workspace_guard_blocks_path_outside_root() {
    let dir = tempdir().expect("tempdir");
    let mut registry = ToolRegistry::new(ToolPolicy::new(vec!["filesystem.read".into()], vec![], vec![]))
        .with_workspace_guard(WorkspaceGuard::new(dir.path()));
    registry.register(ToolSpec::new("filesystem.read"), echo_handler());
    let clock = FakeClock::new();
    let call = ToolCall::new("filesystem.read").with_arg("path", "../escape.txt");
    let result = registry.call(&call, false, &clock);
    assert!(result.is_error);
    assert_eq!(result.status(), Some("workspace_violation"));
}
