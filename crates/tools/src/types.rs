// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool call/result/spec types, grounded in
//! `original_source/src/amon/tooling/types.py`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use amon_core::{EventId, NodeId, ProjectId, RunId, SessionId};

/// Allow/ask/deny policy outcome for a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Ask,
    Deny,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Ask => "ask",
            Decision::Deny => "deny",
        }
    }
}

/// Where a tool's implementation lives, recorded on [`ToolSpec`] and echoed
/// in audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSource {
    Builtin,
    Native,
    Unknown,
}

impl ToolSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolSource::Builtin => "builtin",
            ToolSource::Native => "native",
            ToolSource::Unknown => "unknown",
        }
    }
}

/// A registered tool's static interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
    pub source: ToolSource,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
            source: ToolSource::Builtin,
        }
    }

    pub fn native(mut self) -> Self {
        self.source = ToolSource::Native;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A tool invocation request. `args` values are rendered to strings at the
/// policy/workspace-guard layer, matching the original's string-keyed
/// `call.args` mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    pub args: BTreeMap<String, Value>,
    pub caller: Option<String>,
    pub project_id: Option<ProjectId>,
    pub session_id: Option<SessionId>,
    pub run_id: Option<RunId>,
    pub node_id: Option<NodeId>,
    pub event_id: Option<EventId>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: BTreeMap::new(),
            caller: None,
            project_id: None,
            session_id: None,
            run_id: None,
            node_id: None,
            event_id: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn with_node(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn with_event(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    /// Looks up `command`, falling back to `cmd`, matching
    /// `policy.py::_matches_pattern`.
    pub fn command_text(&self) -> Option<&str> {
        self.args
            .get("command")
            .or_else(|| self.args.get("cmd"))
            .and_then(Value::as_str)
    }
}

/// The outcome of a tool invocation. `meta.status` carries a
/// machine-readable discriminator drawn from [`amon_core::ErrorKind::status_str`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Value>,
    pub is_error: bool,
    pub meta: BTreeMap<String, Value>,
}

impl ToolResult {
    pub fn ok(content: Vec<Value>) -> Self {
        Self {
            content,
            is_error: false,
            meta: BTreeMap::new(),
        }
    }

    pub fn text_error(text: impl Into<String>, status: &str) -> Self {
        let mut meta = BTreeMap::new();
        meta.insert("status".to_string(), Value::String(status.to_string()));
        Self {
            content: vec![serde_json::json!({"type": "text", "text": text.into()})],
            is_error: true,
            meta,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.meta.get("status").and_then(Value::as_str)
    }
}
