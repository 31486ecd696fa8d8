// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glob-tiered tool policy and workspace-confined path guard (C5),
//! grounded in `original_source/src/amon/tooling/policy.py`.

use std::path::{Path, PathBuf};

use amon_store::DEFAULT_DENY_GLOBS;

use crate::error::ToolError;
use crate::types::{Decision, ToolCall};

/// Allow/ask/deny glob tiers. Deny is checked first, then ask, then allow;
/// first match in a tier wins. No match anywhere defaults to deny.
#[derive(Debug, Clone, Default)]
pub struct ToolPolicy {
    pub allow: Vec<String>,
    pub ask: Vec<String>,
    pub deny: Vec<String>,
}

impl ToolPolicy {
    pub fn new(allow: Vec<String>, ask: Vec<String>, deny: Vec<String>) -> Self {
        Self { allow, ask, deny }
    }

    pub fn decide(&self, call: &ToolCall) -> Decision {
        self.explain(call).0
    }

    /// Returns the decision plus the pattern that produced it, if any.
    pub fn explain(&self, call: &ToolCall) -> (Decision, Option<String>) {
        if let Some(pattern) = first_match(call, &self.deny) {
            return (Decision::Deny, Some(pattern));
        }
        if let Some(pattern) = first_match(call, &self.ask) {
            return (Decision::Ask, Some(pattern));
        }
        if let Some(pattern) = first_match(call, &self.allow) {
            return (Decision::Allow, Some(pattern));
        }
        (Decision::Deny, None)
    }
}

fn first_match(call: &ToolCall, patterns: &[String]) -> Option<String> {
    patterns
        .iter()
        .find(|pattern| matches_pattern(call, pattern))
        .cloned()
}

fn matches_pattern(call: &ToolCall, pattern: &str) -> bool {
    let prefix = format!("{}:", call.tool);
    if let Some(command_glob) = pattern.strip_prefix(&prefix) {
        return call
            .command_text()
            .map(|command| glob_match(command_glob, command))
            .unwrap_or(false);
    }
    glob_match(pattern, &call.tool)
}

fn glob_match(pattern: &str, text: &str) -> bool {
    glob::Pattern::new(pattern)
        .map(|p| p.matches(text))
        .unwrap_or(false)
}

/// Confines filesystem-touching tool arguments to a workspace root.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    workspace_root: PathBuf,
    deny_path_globs: Vec<String>,
}

impl WorkspaceGuard {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            deny_path_globs: DEFAULT_DENY_GLOBS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_deny_globs(mut self, globs: Vec<String>) -> Self {
        self.deny_path_globs = globs;
        self
    }

    pub fn assert_in_workspace(&self, path: impl AsRef<Path>) -> Result<PathBuf, ToolError> {
        let globs: Vec<&str> = self.deny_path_globs.iter().map(String::as_str).collect();
        amon_store::canonicalize_path(&self.workspace_root, path.as_ref(), &globs).map_err(
            |source| match source {
                amon_store::StoreError::WorkspaceViolation(p) => ToolError::WorkspaceViolation(p),
                other => ToolError::Store(other),
            },
        )
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
