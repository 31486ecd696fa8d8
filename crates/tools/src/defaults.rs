// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default policy tiers (supplemental; present in
//! `original_source/src/amon/tooling/bootstrap.py` as `DEFAULT_ALLOW`/
//! `DEFAULT_ASK`/`DEFAULT_DENY` but dropped by the distillation). Deny is
//! widened here beyond the original's empty deny tier to cover process and
//! shell execution by default — a deliberate hardening recorded in
//! DESIGN.md, since a daemon with no human approving `ask` decisions should
//! not silently execute shell commands.

use crate::policy::ToolPolicy;

pub fn default_allow() -> Vec<String> {
    vec![
        "filesystem.read".into(),
        "filesystem.list".into(),
        "filesystem.glob".into(),
        "filesystem.grep".into(),
        "memory.get".into(),
        "memory.search".into(),
        "artifacts.write_text".into(),
        "artifacts.write_file".into(),
    ]
}

pub fn default_ask() -> Vec<String> {
    vec![
        "filesystem.write".into(),
        "filesystem.patch".into(),
        "sandbox.run".into(),
        "memory.put".into(),
        "memory.delete".into(),
        "web.fetch".into(),
        "web.search".into(),
        "audit.export".into(),
    ]
}

pub fn default_deny() -> Vec<String> {
    vec![
        "filesystem.delete".into(),
        "process.exec".into(),
        "process.spawn".into(),
        "process.kill".into(),
        "terminal.exec".into(),
        "terminal.session.*".into(),
    ]
}

impl ToolPolicy {
    /// The out-of-the-box policy: read-only/search tools allowed, writes and
    /// network access ask, shell/process execution and deletion denied.
    pub fn with_default_policy() -> Self {
        ToolPolicy::new(default_allow(), default_ask(), default_deny())
    }
}

#[cfg(test)]
#[path = "defaults_tests.rs"]
mod tests;
