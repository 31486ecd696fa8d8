// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redacted audit sink (C5), grounded in
//! `original_source/src/amon/tooling/audit.py`. Raw call arguments and
//! results are never written — only their SHA-256 digests.

use std::path::{Path, PathBuf};

use amon_core::Clock;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{Decision, ToolCall, ToolResult, ToolSource};

/// One line of `<home>/logs/tool_audit.jsonl`.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub ts: String,
    pub tool: String,
    pub caller: Option<String>,
    pub project_id: Option<String>,
    pub session_id: Option<String>,
    pub decision: String,
    pub is_error: bool,
    pub status: Option<String>,
    pub duration_ms: u64,
    pub source: String,
    pub args_sha256: String,
    pub result_sha256: String,
}

pub trait AuditSink: Send + Sync {
    fn record(
        &self,
        call: &ToolCall,
        result: &ToolResult,
        decision: Decision,
        duration_ms: u64,
        source: ToolSource,
        clock: &dyn Clock,
    );
}

/// Discards every record. Used in tests and wherever auditing is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(
        &self,
        _call: &ToolCall,
        _result: &ToolResult,
        _decision: Decision,
        _duration_ms: u64,
        _source: ToolSource,
        _clock: &dyn Clock,
    ) {
    }
}

/// Appends redacted [`AuditRecord`]s to a JSONL file via
/// `amon_store::append_jsonl`.
#[derive(Debug, Clone)]
pub struct FileAuditSink {
    log_path: PathBuf,
}

impl FileAuditSink {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

impl AuditSink for FileAuditSink {
    fn record(
        &self,
        call: &ToolCall,
        result: &ToolResult,
        decision: Decision,
        duration_ms: u64,
        source: ToolSource,
        clock: &dyn Clock,
    ) {
        let record = AuditRecord {
            ts: clock.now_rfc3339(),
            tool: call.tool.clone(),
            caller: call.caller.clone(),
            project_id: call.project_id.as_ref().map(|id| id.as_str().to_string()),
            session_id: call.session_id.as_ref().map(|id| id.as_str().to_string()),
            decision: decision.as_str().to_string(),
            is_error: result.is_error,
            status: result.status().map(str::to_string),
            duration_ms,
            source: source.as_str().to_string(),
            args_sha256: hash_json(&call.args),
            result_sha256: hash_json(&result.content),
        };
        // Audit failures must never interrupt tool dispatch.
        if let Err(error) = amon_store::append_jsonl(&self.log_path, &record) {
            tracing::warn!(path = %self.log_path.display(), %error, "failed to write audit record");
        }
    }
}

fn hash_json<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    hex::encode(digest)
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
