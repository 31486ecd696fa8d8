// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed tool dispatcher (C5), grounded on
//! `original_source/src/amon/tooling/registry.py::ToolRegistry.call`.

use std::collections::HashMap;
use std::time::Instant;

use amon_core::Clock;

use crate::audit::{AuditSink, NullAuditSink};
use crate::policy::{ToolPolicy, WorkspaceGuard};
use crate::types::{Decision, ToolCall, ToolResult, ToolSource, ToolSpec};

pub type ToolHandler = Box<dyn Fn(&ToolCall) -> ToolResult + Send + Sync>;

const FILESYSTEM_PATH_KEYS: [&str; 2] = ["path", "root"];
const CWD_TOOLS: [&str; 3] = ["process.exec", "terminal.exec", "terminal.session.start"];

pub struct ToolRegistry {
    policy: ToolPolicy,
    workspace_guard: Option<WorkspaceGuard>,
    audit_sink: Box<dyn AuditSink>,
    specs: HashMap<String, ToolSpec>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new(policy: ToolPolicy) -> Self {
        Self {
            policy,
            workspace_guard: None,
            audit_sink: Box::new(NullAuditSink),
            specs: HashMap::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn with_workspace_guard(mut self, guard: WorkspaceGuard) -> Self {
        self.workspace_guard = Some(guard);
        self
    }

    pub fn with_audit_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit_sink = sink;
        self
    }

    pub fn register(&mut self, spec: ToolSpec, handler: ToolHandler) {
        self.handlers.insert(spec.name.clone(), handler);
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn list_specs(&self) -> Vec<&ToolSpec> {
        self.specs.values().collect()
    }

    pub fn get_spec(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.get(name)
    }

    /// Dispatches `call` following the five-step sequence: unknown-tool
    /// check, policy decision, workspace-guard application, handler
    /// invocation, redacted audit write.
    pub fn call(&self, call: &ToolCall, require_approval: bool, clock: &dyn Clock) -> ToolResult {
        let start = Instant::now();

        let Some(spec) = self.specs.get(&call.tool) else {
            let result = ToolResult::text_error(
                format!("Unknown tool: {}", call.tool),
                "unknown_tool",
            );
            self.audit(call, &result, Decision::Deny, start, ToolSource::Unknown, clock);
            return result;
        };

        let (decision, reason) = self.policy.explain(call);
        match decision {
            Decision::Deny => {
                let reason = reason.unwrap_or_else(|| "no allow rule matched".to_string());
                let result = ToolResult::text_error(
                    format!("Tool execution denied: {reason}"),
                    "denied",
                );
                self.audit(call, &result, decision, start, spec.source, clock);
                return result;
            }
            Decision::Ask if require_approval => {
                let reason = reason.unwrap_or_default();
                let result = ToolResult::text_error(
                    format!("Tool execution requires approval: {reason}"),
                    "approval_required",
                );
                self.audit(call, &result, decision, start, spec.source, clock);
                return result;
            }
            Decision::Ask => {
                let reason = reason.unwrap_or_default();
                let result = ToolResult::text_error(
                    format!("Tool execution not approved: {reason}"),
                    "approval_missing",
                );
                self.audit(call, &result, decision, start, spec.source, clock);
                return result;
            }
            Decision::Allow => {}
        }

        if let Err(error) = self.apply_workspace_guard(call) {
            let result = ToolResult::text_error(error.to_string(), "workspace_violation");
            self.audit(call, &result, decision, start, spec.source, clock);
            return result;
        }

        #[allow(clippy::expect_used)]
        let handler = self
            .handlers
            .get(&call.tool)
            .expect("spec present implies handler present");
        let result = handler(call);
        self.audit(call, &result, decision, start, spec.source, clock);
        result
    }

    fn apply_workspace_guard(&self, call: &ToolCall) -> Result<(), crate::error::ToolError> {
        let Some(guard) = &self.workspace_guard else {
            return Ok(());
        };
        if call.tool.starts_with("filesystem.") {
            for key in FILESYSTEM_PATH_KEYS {
                if let Some(value) = call.args.get(key).and_then(|v| v.as_str()) {
                    guard.assert_in_workspace(value)?;
                }
            }
        }
        if CWD_TOOLS.contains(&call.tool.as_str()) {
            if let Some(cwd) = call.args.get("cwd").and_then(|v| v.as_str()) {
                guard.assert_in_workspace(cwd)?;
            }
        }
        Ok(())
    }

    fn audit(
        &self,
        call: &ToolCall,
        result: &ToolResult,
        decision: Decision,
        start: Instant,
        source: ToolSource,
        clock: &dyn Clock,
    ) {
        let duration_ms = start.elapsed().as_millis() as u64;
        self.audit_sink
            .record(call, result, decision, duration_ms, source, clock);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
