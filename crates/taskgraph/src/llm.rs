// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM client contract for TaskGraph nodes, grounded in
//! `original_source/src/amon/taskgraph2/llm.py`. The concrete provider
//! transport (OpenAI-compatible HTTP client, tool-call loop) is an external
//! collaborator and deliberately out of scope — only the trait callers code
//! against and a fake for tests live here, matching the split already used
//! for `SandboxClient` in `amon-tools`.

use async_trait::async_trait;

use crate::error::TaskGraphError;

/// A single chat message, `(role, content)`.
pub type LlmMessage = (String, String);

#[async_trait]
pub trait TaskGraphLlmClient: Send + Sync {
    async fn generate(&self, messages: &[LlmMessage], model: Option<&str>) -> Result<String, TaskGraphError>;
}

/// In-memory stand-in for tests and for exercising the runtime without a
/// real model backend.
pub struct FakeLlmClient {
    response: String,
}

impl FakeLlmClient {
    pub fn always_returning(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

#[async_trait]
impl TaskGraphLlmClient for FakeLlmClient {
    async fn generate(&self, _messages: &[LlmMessage], _model: Option<&str>) -> Result<String, TaskGraphError> {
        Ok(self.response.clone())
    }
}

/// Returns each of `responses` in order, one per call, then repeats the
/// last response — for exercising node-executor retry/repair-prompt
/// behavior end to end against a real [`crate::runtime::TaskGraphRuntime`].
pub struct SequenceLlmClient {
    responses: Vec<String>,
    call_count: std::sync::atomic::AtomicUsize,
}

impl SequenceLlmClient {
    pub fn new(responses: Vec<String>) -> Self {
        Self { responses, call_count: std::sync::atomic::AtomicUsize::new(0) }
    }
}

#[async_trait]
impl TaskGraphLlmClient for SequenceLlmClient {
    async fn generate(&self, _messages: &[LlmMessage], _model: Option<&str>) -> Result<String, TaskGraphError> {
        let index = self.call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let last = self.responses.len().saturating_sub(1);
        Ok(self.responses[index.min(last)].clone())
    }
}

#[cfg(test)]
#[path = "llm_tests.rs"]
mod tests;
