// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox-runner HTTP contract, grounded in
//! `original_source/src/amon/sandbox/types.py`. The transport implementation
//! is an external collaborator and is deliberately out of scope — only the
//! wire types and the trait callers code against live here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxLimits {
    pub timeout_seconds: u32,
    pub cpu_cores: f64,
    pub memory_mb: u32,
    pub pids: u32,
    pub max_stdout_kb: u32,
    pub max_stderr_kb: u32,
    pub max_output_total_mb: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxRunRequest {
    pub request_id: String,
    pub project_id: String,
    pub image: String,
    pub command: Vec<String>,
    pub working_dir: String,
    pub env: HashMap<String, String>,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
    pub limits: SandboxLimits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxOutputFile {
    pub path: String,
    pub size: u64,
    pub sha256: String,
    pub mime: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxTruncated {
    pub stdout: bool,
    pub stderr: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxRunResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<SandboxTruncated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<SandboxOutputFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SandboxError>,
}

/// One async method, matching `original_source/src/amon/sandbox/client.py`'s
/// single `run_step` entry point. Implemented for tests by
/// [`FakeSandboxClient`]; the real HTTP transport lives outside this crate.
#[async_trait]
pub trait SandboxClient: Send + Sync {
    async fn run(&self, request: SandboxRunRequest) -> Result<SandboxRunResponse, SandboxError>;
}

/// In-memory stand-in for tests and for exercising tool handlers without a
/// real sandbox runner process.
pub struct FakeSandboxClient {
    response: SandboxRunResponse,
}

impl FakeSandboxClient {
    pub fn always_returning(response: SandboxRunResponse) -> Self {
        Self { response }
    }
}

#[async_trait]
impl SandboxClient for FakeSandboxClient {
    async fn run(&self, request: SandboxRunRequest) -> Result<SandboxRunResponse, SandboxError> {
        let mut response = self.response.clone();
        response.request_id = Some(request.request_id);
        Ok(response)
    }
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
