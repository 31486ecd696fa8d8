// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook data model (C3), grounded in
//! `original_source/src/amon/hooks/types.py`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Match criteria applied to an event's payload, all optional and all
/// required when present — see [`crate::matcher`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HookFilter {
    #[serde(default)]
    pub path_glob: Option<String>,
    #[serde(default)]
    pub min_size: Option<i64>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub ignore_actors: Vec<String>,
}

/// What a matched hook does. `tool` is required when `kind == "tool.call"`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HookAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub args: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HookPolicy {
    #[serde(default)]
    pub require_confirm: bool,
}

/// A declarative matching rule loaded from `<home>/hooks/*.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Hook {
    #[serde(skip)]
    pub hook_id: String,
    pub event_types: Vec<String>,
    #[serde(rename = "filter", default)]
    pub filters: HookFilter,
    pub action: HookAction,
    #[serde(default)]
    pub policy: HookPolicy,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub dedupe_key: Option<String>,
    #[serde(default)]
    pub cooldown_seconds: Option<i64>,
    #[serde(default)]
    pub max_concurrency: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

impl Hook {
    /// Structural validation beyond what serde enforces, mirroring
    /// `loader.py::_validate_hook`'s non-schema checks.
    pub fn validate(&self) -> Result<(), String> {
        if self.event_types.is_empty() {
            return Err("event_types must not be empty".to_string());
        }
        if self.action.kind.is_empty() {
            return Err("action.type must not be empty".to_string());
        }
        if self.action.kind == "tool.call" && self.action.tool.is_none() {
            return Err("tool.call requires action.tool".to_string());
        }
        if let Some(max_concurrency) = self.max_concurrency {
            if max_concurrency < 1 {
                return Err("max_concurrency must be greater than 0".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
