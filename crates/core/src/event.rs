// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process-wide [`Event`] record: an immutable entry produced by any
//! component and appended to the project's event log.
//!
//! `Event`'s type space is open: hooks match on dotted strings like
//! `file.created` or `schedule.fired` that are not known at compile time.
//! `Event` is therefore a struct with a `type` field, not a closed enum —
//! the matcher in `amon-hooks` is the thing that interprets the string, not
//! the type system.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Clock;
use crate::ids::{EventId, NodeId, ProjectId, RunId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    Project,
    Job,
    Schedule,
    Tool,
    Policy,
    ChatRouter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl Default for Risk {
    fn default() -> Self {
        Risk::Low
    }
}

/// A not-yet-emitted event: everything the caller controls. [`EventId`] and
/// `ts` are assigned by the emitter (C2), never by the producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(rename = "type")]
    pub kind: String,
    pub scope: EventScope,
    pub actor: String,
    #[serde(default)]
    pub payload: BTreeMap<String, Value>,
    #[serde(default)]
    pub risk: Risk,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub node_id: Option<NodeId>,
    #[serde(default)]
    pub tool: Option<String>,
}

impl EventDraft {
    pub fn new(kind: impl Into<String>, scope: EventScope, actor: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            scope,
            actor: actor.into(),
            payload: BTreeMap::new(),
            risk: Risk::Low,
            project_id: None,
            run_id: None,
            node_id: None,
            tool: None,
        }
    }

    pub fn with_payload(mut self, payload: BTreeMap<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_risk(mut self, risk: Risk) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// An emitted, immutable event. `event_id` and `ts` are fixed at emission and
/// never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub kind: String,
    pub scope: EventScope,
    pub actor: String,
    #[serde(default)]
    pub payload: BTreeMap<String, Value>,
    pub risk: Risk,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub node_id: Option<NodeId>,
    #[serde(default)]
    pub tool: Option<String>,
    pub ts: String,
}

impl Event {
    /// Assigns an ID and timestamp to a draft, producing the immutable event.
    pub fn from_draft(draft: EventDraft, event_id: EventId, clock: &dyn Clock) -> Self {
        Self {
            event_id,
            kind: draft.kind,
            scope: draft.scope,
            actor: draft.actor,
            payload: draft.payload,
            risk: draft.risk,
            project_id: draft.project_id,
            run_id: draft.run_id,
            node_id: draft.node_id,
            tool: draft.tool,
            ts: clock.now_rfc3339(),
        }
    }

    /// Looks up a payload field, falling back to top-level event fields named
    /// the same way hooks reference them (`event.project_id`, `event.type`).
    /// Mirrors `hooks/matcher.py::_event_value`.
    pub fn value_at(&self, dotted_path: &str) -> Option<Value> {
        let mut parts = dotted_path.splitn(2, '.');
        let head = parts.next()?;
        let rest = parts.next();

        let root = match head {
            "type" => Some(Value::String(self.kind.clone())),
            "actor" => Some(Value::String(self.actor.clone())),
            "project_id" => self.project_id.as_ref().map(|p| Value::String(p.as_str().to_string())),
            "run_id" => self.run_id.as_ref().map(|r| Value::String(r.as_str().to_string())),
            "node_id" => self.node_id.as_ref().map(|n| Value::String(n.as_str().to_string())),
            "event_id" => Some(Value::String(self.event_id.as_str().to_string())),
            "payload" => Some(Value::Object(
                self.payload
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )),
            other => self.payload.get(other).cloned(),
        }?;

        match rest {
            None => Some(root),
            Some(path) => value_at_path(&root, path),
        }
    }
}

fn value_at_path(value: &Value, path: &str) -> Option<Value> {
    let mut cursor = value;
    for part in path.split('.') {
        cursor = cursor.as_object()?.get(part)?;
    }
    Some(cursor.clone())
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
