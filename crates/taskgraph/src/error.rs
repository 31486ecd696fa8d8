// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the TaskGraph runtime (C6/C7/C8), grounded in
//! `original_source/src/amon/taskgraph2/{schema,runtime,node_executor}.py`.

use amon_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum TaskGraphError {
    #[error("invalid task graph: {0}")]
    Invalid(String),
    #[error("json extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("output validation failed: {0}")]
    ValidationFailed(String),
    #[error("tool step failed: {0}")]
    ToolFailed(String),
    #[error("llm call failed: {0}")]
    LlmFailed(String),
    #[error("run canceled")]
    Canceled,
    #[error("node hard timeout: node_id={0}")]
    Timeout(String),
    #[error("run did not complete, pending nodes: {0:?}")]
    Incomplete(Vec<String>),
    #[error(transparent)]
    Store(#[from] amon_store::StoreError),
    #[error(transparent)]
    Tool(#[from] amon_tools::ToolError),
}

impl HasErrorKind for TaskGraphError {
    fn kind(&self) -> ErrorKind {
        match self {
            TaskGraphError::Invalid(_) => ErrorKind::ValidationFailed,
            TaskGraphError::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            TaskGraphError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            TaskGraphError::ToolFailed(_) => ErrorKind::ExecutionFailed,
            TaskGraphError::LlmFailed(_) => ErrorKind::ExecutionFailed,
            TaskGraphError::Canceled => ErrorKind::Canceled,
            TaskGraphError::Timeout(_) => ErrorKind::TimeoutExceeded,
            TaskGraphError::Incomplete(_) => ErrorKind::ExecutionFailed,
            TaskGraphError::Store(source) => source.kind(),
            TaskGraphError::Tool(source) => source.kind(),
        }
    }
}
