// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use amon_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("path is outside workspace: {0}")]
    WorkspaceViolation(PathBuf),
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Store(#[from] amon_store::StoreError),
}

impl HasErrorKind for ToolError {
    fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool(_) => ErrorKind::NotFound,
            ToolError::WorkspaceViolation(_) => ErrorKind::WorkspaceViolation,
            ToolError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            ToolError::Store(source) => source.kind(),
        }
    }
}
